/*!
 * Prelude module for hapbridge core.
 *
 * Re-exports the commonly used types so dependent crates can import them in
 * one line.
 */

pub use crate::config::{Config, ConfigBuilder, IgnoreRule, SharedConfig};
pub use crate::error::{Error, Result};
pub use crate::event::{EventBus, EventReceiver, SharedEventBus};
pub use crate::types::{Address, Value};
pub use crate::utils::spawn_and_log;

pub use tracing::{debug, error, info, trace, warn};
