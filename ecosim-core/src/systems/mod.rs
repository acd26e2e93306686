//! Tick systems, listed in execution order.

pub mod production;
pub mod buildings;
pub mod trade;
pub mod demand;
pub mod market;
pub mod consumption;
pub mod finance;

pub use buildings::run_buildings_tick;
pub use consumption::run_consumption_tick;
pub use demand::run_demand_tick;
pub use finance::run_finance_tick;
pub use market::run_pricing_tick;
pub use production::run_production_tick;
pub use trade::run_trade_tick;
