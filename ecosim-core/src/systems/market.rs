//! Market price formation.

use crate::rules::adjusted_price;
use crate::state::WorldState;
use tracing::instrument;

/// Moves every price toward balancing this tick's demand against stock.
///
/// Supply is current stock, which already includes production and trade.
#[instrument(skip_all, name = "pricing")]
pub fn run_pricing_tick(state: &mut WorldState) {
    for market in state.markets.values_mut() {
        for good in market.goods.values_mut() {
            let supply = good.stock.max(0.0);
            let new_price = adjusted_price(
                good.price,
                good.price_k,
                good.demanded,
                supply,
                good.min_price,
                good.max_price,
            );
            good.last_delta = new_price - good.price;
            good.price = new_price;
        }
    }
}
