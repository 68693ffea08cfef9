/*!
 * hapbridge Core
 *
 * This crate provides the shared foundation for the hapbridge system,
 * including configuration, logging, the event bus and common value types.
 */

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod prelude;
pub mod types;
pub mod utils;

/// Re-export of dependencies that are part of the public API
pub mod deps {
    pub use chrono;
    pub use serde;
    pub use tokio;
    pub use tracing;
}

/// hapbridge core crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library initialization with the logging settings of `config`
pub fn init(config: &config::Config) -> Result<(), error::Error> {
    logging::init_from_config(&config.logging)?;
    tracing::info!("hapbridge core {} initialized", VERSION);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
