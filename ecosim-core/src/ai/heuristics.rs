//! Read-only scoring helpers for AI decisions.

use crate::math::safe_div;
use crate::state::{GoodId, MarketGood, WorldState};
use std::collections::BTreeMap;

/// Per-unit cost of moving goods on an AI-evaluated route.
pub const ASSUMED_TRANSPORT_COST: f64 = 0.2;
/// Tariff rate assumed when evaluating a prospective route.
pub const ASSUMED_TARIFF: f64 = 0.05;

/// Mean `satisfaction_avg` over the country's pops; 1.0 with no pops.
pub fn country_satisfaction(state: &WorldState, country_id: &str) -> f64 {
    let Some(country) = state.countries.get(country_id) else {
        return 1.0;
    };
    let (total, count) = country
        .pop_ids
        .iter()
        .filter_map(|pop_id| state.pops.get(pop_id))
        .fold((0.0, 0u32), |(total, count), pop| {
            (total + pop.satisfaction_avg, count + 1)
        });
    safe_div(total, f64::from(count), 1.0)
}

/// `(unmet + 1) × price / base_price` for every good in the country's market.
pub fn shortage_scores(state: &WorldState, country_id: &str) -> BTreeMap<GoodId, f64> {
    let Some(market) = state
        .countries
        .get(country_id)
        .and_then(|c| state.markets.get(&c.market_id))
    else {
        return BTreeMap::new();
    };
    market
        .goods
        .iter()
        .map(|(good_id, good)| {
            let price_factor = safe_div(good.price, good.base_price, 1.0);
            (good_id.clone(), (good.unmet + 1.0) * price_factor)
        })
        .collect()
}

/// Demand pressure on a good: `demanded / max(0.01, stock)`.
pub fn shortage_ratio(good: &MarketGood) -> f64 {
    safe_div(good.demanded, good.stock.max(0.01), 0.0)
}

/// Raw worth of a region: `Σ output × base_price`.
pub fn region_value(state: &WorldState, region_id: &str) -> f64 {
    let Some(region) = state.regions.get(region_id) else {
        return 0.0;
    };
    region
        .outputs
        .iter()
        .filter_map(|(good_id, &amount)| state.goods.get(good_id).map(|g| amount * g.base_price))
        .sum()
}

/// Per-unit profit of importing into and exporting out of the own market.
///
/// Returns `(import_profit, export_profit)`, each net of the assumed transport
/// cost and of the tariff paid at the destination price.
pub fn import_export_profit(own_price: f64, other_price: f64) -> (f64, f64) {
    let import_cost = other_price + ASSUMED_TRANSPORT_COST + ASSUMED_TARIFF * own_price;
    let export_cost = own_price + ASSUMED_TRANSPORT_COST + ASSUMED_TARIFF * other_price;
    (own_price - import_cost, other_price - export_cost)
}
