//! # Economic Simulation Core
//!
//! Deterministic tick-based simulation of a small multi-country economy:
//! regions produce raw goods, buildings process them, trade routes move
//! them between national markets, pops buy what they need, and countries
//! collect taxes and pay upkeep.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Commands   │────▶│ execute_     │────▶│ WorldState   │
//! │  (player)   │     │ command      │     │ (mutable)    │
//! └─────────────┘     └──────────────┘     └──────┬───────┘
//!                                                 │ step_tick
//!                     ┌──────────────┐     ┌──────▼───────┐
//!                     │  Observers   │◀────│ systems + AI │
//!                     │  (side fx)   │     │ (fixed order)│
//!                     └──────────────┘     └──────────────┘
//! ```
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`WorldState`] | Complete simulation state (goods, markets, regions, pops, routes) |
//! | [`Command`] | Player actions (build, annex, add route, set tax, ...) |
//! | [`step_tick`] | Advances the world one tick in place |
//! | [`AiPlayer`] | Trait for AI decision making |
//! | [`SimObserver`] | Trait for observing state after ticks |
//!
//! ## Determinism
//!
//! All collections are ordered maps and every system walks them in sorted-id
//! order. Two worlds built the same way and fed the same commands stay
//! identical tick for tick.

pub mod ai;
pub mod config;
pub mod input;
pub mod math;
pub mod metrics;
pub mod observer;
pub mod profiling;
pub mod rules;
pub mod scenario;
pub mod state;
pub mod step;
pub mod systems;
pub mod testing;

pub use ai::{AiPlayer, GreedyAi};
pub use config::{ConfigError, SimConfig};
pub use input::Command;
pub use metrics::SimMetrics;
pub use observer::console::ConsoleObserver;
pub use observer::event_log::EventLogObserver;
pub use observer::{ObserverConfig, ObserverError, ObserverRegistry, SimObserver, Snapshot};
pub use scenario::default_scenario;
pub use state::{Event, EventKind, WorldState};
pub use step::{advance, advance_with_metrics, execute_command, step_tick, ActionError, CommandOutcome};
