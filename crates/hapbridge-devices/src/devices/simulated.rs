/*!
 * Generic in-memory device used by every simulated class.
 */
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::device::{AlarmMode, Device, DeviceError, DeviceInfo, FanSpeed, Result};
use crate::registry::ChangeNotifier;

/// A command received by a simulated device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Light on/off
    Light(bool),
    /// Light dim level
    LightDim(u8),
    /// Lock/unlock
    Lock(bool),
    /// Outlet on/off
    Outlet(bool),
    /// Fan speed
    Fan(FanSpeed),
    /// Alarm arm mode
    AlarmMode(AlarmMode),
}

impl DeviceCommand {
    /// Command name as used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            DeviceCommand::Light(_) => "light",
            DeviceCommand::LightDim(_) => "light_dim",
            DeviceCommand::Lock(_) => "lock",
            DeviceCommand::Outlet(_) => "outlet",
            DeviceCommand::Fan(_) => "fan",
            DeviceCommand::AlarmMode(_) => "alarm_mode",
        }
    }
}

/// An in-memory device holding state `S`
#[derive(Debug)]
pub struct SimulatedDevice<S> {
    /// Device information
    info: DeviceInfo,
    /// Current device state
    state: RwLock<S>,
    /// Every command received, including failed ones
    commands: Mutex<Vec<DeviceCommand>>,
    /// When set, commands are recorded but fail without changing state
    fail_commands: AtomicBool,
    /// Announces simulated external changes
    notifier: ChangeNotifier,
}

impl<S: Clone + Debug + Send + Sync> SimulatedDevice<S> {
    /// Create a device with an initial state
    pub fn with_state(info: DeviceInfo, state: S, notifier: ChangeNotifier) -> Self {
        Self {
            info,
            state: RwLock::new(state),
            commands: Mutex::new(Vec::new()),
            fail_commands: AtomicBool::new(false),
            notifier,
        }
    }

    /// A copy of the current state
    pub fn state(&self) -> S {
        self.read(S::clone)
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Commands received so far, oldest first
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of commands received so far
    pub fn command_count(&self) -> usize {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Forget the recorded commands
    pub fn clear_commands(&self) {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Make subsequent commands fail (or succeed again)
    pub fn set_fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }

    /// Change the state as if it happened at the device, then announce it
    ///
    /// Returns the number of listeners the change notification reached.
    pub fn simulate_external_change(&self, change: impl FnOnce(&mut S)) -> Result<usize> {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            change(&mut state);
        }
        self.notifier.notify(&self.info.address)
    }

    /// Record `command` and apply it to the state unless failures are injected
    pub(crate) async fn execute(
        &self,
        command: DeviceCommand,
        apply: impl FnOnce(&mut S) + Send,
    ) -> Result<()> {
        // Commands complete asynchronously on a real controller
        tokio::task::yield_now().await;

        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);

        if self.fail_commands.load(Ordering::SeqCst) {
            warn!("Simulated failure of {:?} on {}", command, self.info.address);
            return Err(DeviceError::CommandFailed {
                address: self.info.address.clone(),
                command: command.name().to_string(),
                reason: "simulated failure".to_string(),
            });
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
        debug!("{} applied {:?}", self.info.address, command);
        Ok(())
    }
}

impl<S: Debug + Send + Sync> Device for SimulatedDevice<S> {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }
}
