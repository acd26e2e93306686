use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Accumulated timing metrics for simulation performance.
#[derive(Default, Clone, Debug, Serialize, Deserialize)]
pub struct SimMetrics {
    pub total_ticks: u64,
    pub total_time: Duration,
    pub production_time: Duration,
    pub buildings_time: Duration,
    pub trade_time: Duration,
    pub demand_time: Duration,
    pub pricing_time: Duration,
    pub consumption_time: Duration,
    pub finance_time: Duration,
    pub ai_time: Duration,
    /// Time spent in observers (event log, console, etc.)
    pub observer_time: Duration,
    /// Wall clock time from first tick to last
    pub wall_time: Duration,
}

impl SimMetrics {
    pub fn tick_avg_ms(&self) -> f64 {
        if self.total_ticks == 0 {
            0.0
        } else {
            self.total_time.as_secs_f64() * 1000.0 / self.total_ticks as f64
        }
    }

    pub fn ticks_per_second(&self) -> f64 {
        if self.total_time.as_secs_f64() == 0.0 {
            0.0
        } else {
            self.total_ticks as f64 / self.total_time.as_secs_f64()
        }
    }

    /// Per-system durations in execution order, for reports.
    pub fn system_breakdown(&self) -> [(&'static str, Duration); 8] {
        [
            ("production", self.production_time),
            ("buildings", self.buildings_time),
            ("trade", self.trade_time),
            ("demand", self.demand_time),
            ("pricing", self.pricing_time),
            ("consumption", self.consumption_time),
            ("finance", self.finance_time),
            ("ai", self.ai_time),
        ]
    }
}
