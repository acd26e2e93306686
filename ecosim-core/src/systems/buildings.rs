//! Building recipe processing.
//!
//! Each enabled building converts inputs from its region's market into
//! outputs, limited by effective capacity and available stock. Buildings that
//! would run at a loss (output value not above 90% of input cost at current
//! prices) stay idle for the tick.

use crate::rules::max_process_runs;
use crate::state::{GoodId, Market, WorldState};
use std::collections::BTreeMap;
use tracing::instrument;

/// Output value must exceed `input_cost × PROFIT_GATE` for a building to run.
pub const PROFIT_GATE: f64 = 0.9;

/// Value of a goods basket at the market's current prices.
///
/// Goods the market does not carry contribute nothing.
pub fn basket_value(market: &Market, goods: &BTreeMap<GoodId, f64>) -> f64 {
    goods
        .iter()
        .filter_map(|(good_id, &amount)| market.goods.get(good_id).map(|g| g.price * amount))
        .sum()
}

/// Runs every enabled building once, in building-id order.
///
/// Inputs for all runs are deducted before outputs are credited, so a
/// building never feeds on its own output within the tick.
#[instrument(skip_all, name = "buildings")]
pub fn run_buildings_tick(state: &mut WorldState) {
    let WorldState {
        buildings,
        building_types,
        regions,
        markets,
        ..
    } = state;

    for building in buildings.values() {
        if !building.enabled {
            continue;
        }
        let Some(building_type) = building_types.get(&building.type_id) else {
            log::warn!(
                "Building {} has unknown type {}",
                building.id,
                building.type_id
            );
            continue;
        };
        let Some(market_id) = regions
            .get(&building.region_id)
            .and_then(|r| r.market_id.as_ref())
        else {
            continue;
        };
        let Some(market) = markets.get_mut(market_id) else {
            continue;
        };

        let input_cost = basket_value(market, &building_type.inputs);
        let output_value = basket_value(market, &building_type.outputs);
        if output_value <= input_cost * PROFIT_GATE {
            log::trace!(
                "Building {} idle: output {:.2} vs input {:.2}",
                building.id,
                output_value,
                input_cost
            );
            continue;
        }

        let capacity = building.effective_capacity(building_type);
        let runs = max_process_runs(market, &building_type.inputs, capacity);
        if runs <= 0.0 {
            continue;
        }

        for (good_id, &amount) in &building_type.inputs {
            if amount <= 0.0 {
                continue;
            }
            if let Some(good) = market.goods.get_mut(good_id) {
                good.stock = (good.stock - amount * runs).max(0.0);
            }
        }
        for (good_id, &amount) in &building_type.outputs {
            if amount <= 0.0 {
                continue;
            }
            if let Some(good) = market.goods.get_mut(good_id) {
                let produced = amount * runs;
                good.stock += produced;
                good.produced += produced;
            } else {
                log::warn!(
                    "Building {} outputs {} which market {} does not carry",
                    building.id,
                    good_id,
                    market.id
                );
            }
        }

        log::trace!("Building {} ran {:.2} times", building.id, runs);
    }
}
