//! Inter-market trade execution.
//!
//! Routes run strictly in route-id order. A route sees the stock left behind
//! by every earlier route in the same pass, so the pass is not a snapshot.
//!
//! Per route:
//! - `tariff_cost = tariff × dst_price`
//! - `spread = dst_price − (src_price + transport_cost + tariff_cost)`
//! - `target = capacity × clamp(spread / max(1, dst_price), 0, 1)`
//! - `moved = min(target, src_stock − 10% reserve)`
//!
//! Tariff revenue (`moved × tariff_cost`) goes to the importing country.

use crate::math::{clamp, safe_div};
use crate::state::{EventKind, WorldState};
use tracing::instrument;

/// Share of source stock a route never exports.
pub const SOURCE_RESERVE: f64 = 0.1;

/// Flow computed for one route before it is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteFlow {
    pub moved: f64,
    pub spread: f64,
    pub tariff_cost: f64,
}

/// Evaluates a route at the given prices and source stock.
///
/// Returns `None` when the route is unprofitable or nothing can move.
pub fn route_flow(
    src_price: f64,
    src_stock: f64,
    dst_price: f64,
    capacity: f64,
    tariff: f64,
    transport_cost: f64,
) -> Option<RouteFlow> {
    let tariff_cost = tariff * dst_price;
    let spread = dst_price - (src_price + transport_cost + tariff_cost);
    if spread <= 0.0 {
        return None;
    }

    let factor = clamp(safe_div(spread, dst_price.max(1.0), 0.0), 0.0, 1.0);
    let target = capacity.max(0.0) * factor;
    let reserve = src_stock * SOURCE_RESERVE;
    let available = (src_stock - reserve).max(0.0);
    let moved = target.min(available);
    if moved <= 0.0 {
        return None;
    }

    Some(RouteFlow {
        moved,
        spread,
        tariff_cost,
    })
}

/// Executes every trade route once.
#[instrument(skip_all, name = "trade")]
pub fn run_trade_tick(state: &mut WorldState) {
    let route_ids: Vec<_> = state.routes.keys().cloned().collect();

    for route_id in route_ids {
        let Some(route) = state.routes.get(&route_id) else {
            continue;
        };
        let src_market_id = route.src_market_id.clone();
        let dst_market_id = route.dst_market_id.clone();
        let good_id = route.good_id.clone();

        let src = state.market_good(&src_market_id, &good_id);
        let dst = state.market_good(&dst_market_id, &good_id);
        let flow = match (src, dst) {
            (Some(src), Some(dst)) if src_market_id != dst_market_id => route_flow(
                src.price,
                src.stock,
                dst.price,
                route.capacity,
                route.tariff,
                route.transport_cost,
            ),
            (Some(_), Some(_)) => None,
            _ => {
                log::warn!("Route {} references a missing market or good", route_id);
                None
            }
        };

        let Some(RouteFlow {
            mut moved,
            spread,
            tariff_cost,
        }) = flow
        else {
            if let Some(route) = state.routes.get_mut(&route_id) {
                route.clear_flow();
            }
            continue;
        };

        // Source side
        if let Some(src) = state
            .markets
            .get_mut(&src_market_id)
            .and_then(|m| m.goods.get_mut(&good_id))
        {
            if src.stock - moved < 0.0 {
                moved = src.stock.max(0.0);
            }
            src.stock = (src.stock - moved).max(0.0);
            src.traded_out += moved;
        }

        // Destination side
        let importer = match state.markets.get_mut(&dst_market_id) {
            Some(market) => {
                if let Some(dst) = market.goods.get_mut(&good_id) {
                    dst.stock += moved;
                    dst.traded_in += moved;
                }
                Some(market.country_id.clone())
            }
            None => None,
        };

        let tariff_revenue = moved * tariff_cost;
        if let Some(route) = state.routes.get_mut(&route_id) {
            route.last_moved = moved;
            route.last_profit = moved * spread;
            route.last_tariff = tariff_revenue;
        }
        if let Some(country) = importer.and_then(|id| state.countries.get_mut(&id)) {
            country.treasury += tariff_revenue;
        }

        let message = format!("Route {} moved {:.2} {}", route_id, moved, good_id);
        state.add_event(
            EventKind::Trade,
            message,
            &[("route_id", route_id.as_str()), ("good_id", good_id.as_str())],
        );
    }
}
