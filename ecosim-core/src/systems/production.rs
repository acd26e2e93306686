//! Raw resource production.
//!
//! Every owned region adds its declared outputs to its market, scaled by the
//! price response `clamp(price / base_price, 0.5, 1.5)`:
//! `produced = output × supply_factor(price, base_price)`

use crate::rules::supply_factor;
use crate::state::{GoodId, MarketId, WorldState};
use rayon::prelude::*;
use tracing::instrument;

/// One region output after the price response.
struct RegionOutput {
    market_id: MarketId,
    good_id: GoodId,
    quantity: f64,
}

/// Runs raw production for every owned region.
///
/// Prices are read-only during this system, so quantities are computed in
/// parallel; stock is then credited sequentially in region-id order.
#[instrument(skip_all, name = "production")]
pub fn run_production_tick(state: &mut WorldState) {
    // PHASE 1: Compute quantities (parallel, read-only)
    let markets = &state.markets;
    let outputs: Vec<RegionOutput> = state
        .regions
        .par_iter()
        .filter(|(_, region)| region.owner.is_some())
        .filter_map(|(_, region)| region.market_id.as_ref().map(|m| (region, m)))
        .flat_map_iter(|(region, market_id)| {
            region
                .outputs
                .iter()
                .filter_map(move |(good_id, &amount)| {
                    if amount <= 0.0 {
                        return None;
                    }
                    let Some(good) = markets.get(market_id).and_then(|m| m.goods.get(good_id))
                    else {
                        log::warn!(
                            "Region {} produces {} but market {} does not carry it",
                            region.id,
                            good_id,
                            market_id
                        );
                        return None;
                    };
                    Some(RegionOutput {
                        market_id: market_id.clone(),
                        good_id: good_id.clone(),
                        quantity: amount * supply_factor(good.price, good.base_price),
                    })
                })
        })
        .collect();

    // PHASE 2: Apply (sequential, region-id order)
    for output in outputs {
        if let Some(good) = state
            .markets
            .get_mut(&output.market_id)
            .and_then(|m| m.goods.get_mut(&output.good_id))
        {
            good.stock += output.quantity;
            good.produced += output.quantity;
        }
    }
}
