//! Read-only hooks into a running world.
//!
//! A [`Snapshot`] is a shared copy of the world taken after a tick. Hosts hand
//! it to an [`ObserverRegistry`], which forwards it to each registered
//! [`SimObserver`] whose [`ObserverConfig`] says the tick is due. Observers
//! only ever see the snapshot, so they cannot change the simulation.
//!
//! Two observers ship with the crate:
//!
//! - [`ConsoleObserver`](console::ConsoleObserver) prints a status line per country.
//! - [`EventLogObserver`](event_log::EventLogObserver) streams new events as JSON lines.
//!
//! ```ignore
//! let mut registry = ObserverRegistry::new();
//! registry.register(Box::new(EventLogObserver::file("events.jsonl")?));
//!
//! advance(&mut state, 1);
//! registry.notify(&Snapshot::new(state.clone(), state.tick, 0));
//!
//! // Once the host is done with the world:
//! registry.finish(&Snapshot::new(state.clone(), state.tick, 0));
//! registry.shutdown();
//! ```

pub mod console;
pub mod event_log;

use crate::state::WorldState;
use std::sync::Arc;
use thiserror::Error;

/// World state shared between observers after a tick.
#[derive(Clone)]
pub struct Snapshot {
    pub state: Arc<WorldState>,
    /// Tick the snapshot was taken after.
    pub tick: u64,
    /// `WorldState::checksum`, or 0 when the host did not compute it.
    pub checksum: u64,
}

impl Snapshot {
    pub fn new(state: WorldState, tick: u64, checksum: u64) -> Self {
        Self::from_arc(Arc::new(state), tick, checksum)
    }

    pub fn from_arc(state: Arc<WorldState>, tick: u64, checksum: u64) -> Self {
        Self {
            state,
            tick,
            checksum,
        }
    }
}

#[derive(Error, Debug)]
pub enum ObserverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// An event could not be encoded as JSON.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// An observer's writer lock was poisoned.
    #[error("Observer lock poisoned")]
    Poisoned,
}

/// Which ticks an observer wants to see.
#[derive(Clone, Debug)]
pub struct ObserverConfig {
    /// Every N ticks; 0 leaves only `notify_on_ai_turn`.
    pub frequency: u32,
    /// Also on ticks where AI countries took their turn.
    pub notify_on_ai_turn: bool,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            frequency: 1,
            notify_on_ai_turn: false,
        }
    }
}

/// Receives snapshots of the world. Errors are logged by the registry and
/// never stop the simulation.
pub trait SimObserver: Send + Sync {
    fn on_tick(&self, snapshot: &Snapshot) -> Result<(), ObserverError>;

    /// Name used in log messages.
    fn name(&self) -> &str;

    fn config(&self) -> ObserverConfig {
        ObserverConfig::default()
    }

    /// Final state of the world, delivered once regardless of `config`.
    /// Covers changes made after the last due tick, such as commands applied
    /// before any tick ran.
    fn on_finish(&self, _snapshot: &Snapshot) -> Result<(), ObserverError> {
        Ok(())
    }

    /// Release buffered output.
    fn on_shutdown(&self) {}
}

#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Box<dyn SimObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self { observers: vec![] }
    }

    pub fn register(&mut self, observer: Box<dyn SimObserver>) {
        log::info!("Registered observer: {}", observer.name());
        self.observers.push(observer);
    }

    /// Passes the snapshot to every observer due at `snapshot.tick`.
    pub fn notify(&self, snapshot: &Snapshot) {
        for observer in &self.observers {
            let config = observer.config();
            let on_frequency =
                config.frequency > 0 && snapshot.tick % u64::from(config.frequency) == 0;
            let on_ai_turn = config.notify_on_ai_turn && crate::ai::ai_due(&snapshot.state);

            if on_frequency || on_ai_turn {
                if let Err(e) = observer.on_tick(snapshot) {
                    log::warn!("Observer '{}' error: {}", observer.name(), e);
                }
            }
        }
    }

    /// Passes the final world to every observer.
    pub fn finish(&self, snapshot: &Snapshot) {
        for observer in &self.observers {
            if let Err(e) = observer.on_finish(snapshot) {
                log::warn!("Observer '{}' error: {}", observer.name(), e);
            }
        }
    }

    pub fn shutdown(&self) {
        for observer in &self.observers {
            observer.on_shutdown();
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Drop for ObserverRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}
