//! AI decision-making subsystem
//!
//! AI countries act as the last system of a tick, only on ticks where
//! `tick % ai_interval == 0` and only while AI is enabled. Countries act in
//! the order they were listed in [`WorldState::ai_countries`], each seeing the
//! changes made by the ones before it.
//!
//! # Determinism
//!
//! AI implementations must be deterministic: no randomness, and every scan
//! over goods, markets, routes or regions walks them in sorted-id order with
//! ties going to the first candidate.

pub mod greedy;
pub mod heuristics;

pub use greedy::GreedyAi;

use crate::state::WorldState;
use tracing::instrument;

/// AI decision-making trait.
///
/// Implementations mutate the world directly for one country, logging an
/// event for every action they take.
pub trait AiPlayer: Send + Sync {
    fn act(&self, state: &mut WorldState, country_id: &str);
}

/// True when AI countries get a turn at the current tick.
pub fn ai_due(state: &WorldState) -> bool {
    state.ai_enabled && state.ai_interval > 0 && state.tick % u64::from(state.ai_interval) == 0
}

/// Runs the built-in [`GreedyAi`] for every AI country when due.
#[instrument(skip_all, name = "ai")]
pub fn run_ai_tick(state: &mut WorldState) {
    run_ai_tick_with(state, &GreedyAi);
}

/// Runs `ai` for every AI country when due.
pub fn run_ai_tick_with(state: &mut WorldState, ai: &dyn AiPlayer) {
    if !ai_due(state) {
        return;
    }
    let countries = state.ai_countries.clone();
    for country_id in countries {
        if !state.countries.contains_key(&country_id) {
            log::warn!("AI country {} does not exist", country_id);
            continue;
        }
        ai.act(state, &country_id);
    }
}
