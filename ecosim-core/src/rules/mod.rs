//! Pure, stateless economic rules.
//!
//! Systems feed these functions values read from the world and apply the
//! results themselves; nothing here touches [`WorldState`](crate::WorldState).

pub mod allocation;
pub mod demand;
pub mod pricing;
pub mod recipes;

pub use allocation::affordable_purchase;
pub use demand::adjusted_need;
pub use pricing::{adjusted_price, supply_factor};
pub use recipes::max_process_runs;
