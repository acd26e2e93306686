//! A running world plus the observers and metrics attached to it.

use crate::command_parser::{parse_line, ParseError, Query, ScriptLine, HELP};
use crate::report;
use ecosim_core::state::EventKind;
use ecosim_core::{
    advance_with_metrics, execute_command, ActionError, CommandOutcome, ObserverRegistry,
    SimMetrics, Snapshot, WorldState,
};
use std::time::Instant;
use thiserror::Error;

/// Why a script line had no effect.
#[derive(Debug, Error)]
pub enum LineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Rejected(#[from] ActionError),
}

/// What a script line did.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Skipped,
    Ticked(u64),
    Applied(CommandOutcome),
    /// Text produced by a query.
    Report(String),
}

pub struct Session {
    pub state: WorldState,
    pub registry: ObserverRegistry,
    pub metrics: SimMetrics,
    /// Country that `build` and `annex` act for.
    pub selected: String,
    /// Log the checksum every N ticks (0 = never).
    pub checksum_frequency: u32,
}

impl Session {
    pub fn new(state: WorldState, selected: impl Into<String>) -> Self {
        Self {
            state,
            registry: ObserverRegistry::new(),
            metrics: SimMetrics::default(),
            selected: selected.into(),
            checksum_frequency: 0,
        }
    }

    /// Parses and applies one script line.
    pub fn apply_line(&mut self, line: &str) -> Result<LineOutcome, LineError> {
        match parse_line(line, &self.selected)? {
            None => Ok(LineOutcome::Skipped),
            Some(ScriptLine::Tick(n)) => {
                self.run_ticks(n);
                self.state
                    .add_event(EventKind::Tick, format!("Advanced {n} ticks"), &[]);
                Ok(LineOutcome::Ticked(n))
            }
            Some(ScriptLine::Command(cmd)) => {
                let outcome = execute_command(&mut self.state, &cmd)?;
                log::debug!("Applied {:?}", cmd);
                Ok(LineOutcome::Applied(outcome))
            }
            Some(ScriptLine::Query(query)) => Ok(LineOutcome::Report(self.query(query)?)),
        }
    }

    fn query(&mut self, query: Query) -> Result<String, ActionError> {
        let state = &self.state;
        let text = match query {
            Query::Status => report::status_line(state, &self.selected)
                .map_or_else(|| "No country selected\n".to_string(), |line| line + "\n"),
            Query::Markets => report::markets_list(state),
            Query::Market(id) => {
                let market = state
                    .market(&id)
                    .ok_or_else(|| ActionError::UnknownMarket(id.clone()))?;
                self.selected = market.country_id.clone();
                report::market_table(state, &id).unwrap_or_default()
            }
            Query::Country(id) => {
                let line = report::status_line(state, &id)
                    .ok_or_else(|| ActionError::UnknownCountry(id.clone()))?;
                self.selected = id;
                line + "\n"
            }
            Query::Goods => report::goods_list(state),
            Query::Regions => report::regions_list(state),
            Query::Region(id) => {
                report::region_detail(state, &id).ok_or(ActionError::UnknownRegion(id))?
            }
            Query::Buildings => report::buildings_list(state),
            Query::Help => HELP.to_string(),
        };
        Ok(text)
    }

    /// Hands the final world to every observer, then shuts them down.
    pub fn finish(&mut self) {
        if !self.registry.is_empty() {
            let start = Instant::now();
            let checksum = self.state.checksum();
            let snapshot = Snapshot::new(self.state.clone(), self.state.tick, checksum);
            self.registry.finish(&snapshot);
            self.metrics.observer_time += start.elapsed();
        }
        self.registry.shutdown();
    }

    /// Advances `n` ticks, notifying observers after each one.
    pub fn run_ticks(&mut self, n: u64) {
        for _ in 0..n {
            advance_with_metrics(&mut self.state, 1, &mut self.metrics);

            let tick = self.state.tick;
            let checksum_due =
                self.checksum_frequency > 0 && tick % u64::from(self.checksum_frequency) == 0;
            let checksum = if checksum_due {
                let checksum = self.state.checksum();
                log::info!("Tick {} checksum {:016x}", tick, checksum);
                checksum
            } else {
                0
            };

            if !self.registry.is_empty() {
                let start = Instant::now();
                let snapshot = Snapshot::new(self.state.clone(), tick, checksum);
                self.registry.notify(&snapshot);
                self.metrics.observer_time += start.elapsed();
            }
        }
    }
}
