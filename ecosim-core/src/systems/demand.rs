//! Demand intent: pops announce what they want to buy this tick.
//!
//! The accumulated `demanded` feeds the same tick's price update.

use crate::rules::adjusted_need;
use crate::state::{GoodId, MarketId, WorldState};
use rayon::prelude::*;
use tracing::instrument;

struct DemandIntent {
    market_id: MarketId,
    good_id: GoodId,
    quantity: f64,
}

/// Accumulates price-adjusted pop needs into each market's `demanded`.
#[instrument(skip_all, name = "demand")]
pub fn run_demand_tick(state: &mut WorldState) {
    // PHASE 1: Compute intents (parallel, read-only)
    let markets = &state.markets;
    let countries = &state.countries;
    let intents: Vec<DemandIntent> = state
        .pops
        .par_iter()
        .filter_map(|(_, pop)| {
            let market_id = &countries.get(&pop.country_id)?.market_id;
            let market = markets.get(market_id)?;
            Some((pop, market))
        })
        .flat_map_iter(|(pop, market)| {
            pop.needs.iter().filter_map(move |(good_id, &per_capita)| {
                let need = per_capita * pop.size;
                if need <= 0.0 {
                    return None;
                }
                let good = market.goods.get(good_id)?;
                Some(DemandIntent {
                    market_id: market.id.clone(),
                    good_id: good_id.clone(),
                    quantity: adjusted_need(need, good.price, good.base_price),
                })
            })
        })
        .collect();

    // PHASE 2: Accumulate (sequential, pop-id order)
    for intent in intents {
        if let Some(good) = state
            .markets
            .get_mut(&intent.market_id)
            .and_then(|m| m.goods.get_mut(&intent.good_id))
        {
            good.demanded += intent.quantity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::WorldStateBuilder;

    #[test]
    fn test_demand_at_base_price() {
        let mut state = WorldStateBuilder::new()
            .with_good("grain", 3.0)
            .with_country("north")
            .with_pop("p1", "north", 100.0, 1.0, 10.0, &[("grain", 0.08)])
            .build();

        run_demand_tick(&mut state);

        let grain = state.market_good("market_north", "grain").unwrap();
        assert!((grain.demanded - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_demand_responds_to_price() {
        let mut state = WorldStateBuilder::new()
            .with_good("grain", 3.0)
            .with_country("north")
            .with_price("market_north", "grain", 6.0)
            .with_pop("p1", "north", 100.0, 1.0, 10.0, &[("grain", 0.1)])
            .build();

        run_demand_tick(&mut state);

        // factor 3 / 6 = 0.5
        let grain = state.market_good("market_north", "grain").unwrap();
        assert!((grain.demanded - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_demand_sums_across_pops() {
        let mut state = WorldStateBuilder::new()
            .with_good("grain", 3.0)
            .with_good("tools", 12.0)
            .with_country("north")
            .with_pop("p1", "north", 100.0, 1.0, 10.0, &[("grain", 0.1)])
            .with_pop("p2", "north", 50.0, 1.0, 10.0, &[("grain", 0.1), ("tools", 0.0)])
            .build();

        run_demand_tick(&mut state);

        assert!((state.market_good("market_north", "grain").unwrap().demanded - 15.0).abs() < 1e-12);
        assert_eq!(state.market_good("market_north", "tools").unwrap().demanded, 0.0);
    }

    #[test]
    fn test_pops_demand_only_in_home_market() {
        let mut state = WorldStateBuilder::new()
            .with_good("grain", 3.0)
            .with_country("north")
            .with_country("south")
            .with_pop("p1", "south", 100.0, 1.0, 10.0, &[("grain", 0.1)])
            .build();

        run_demand_tick(&mut state);

        assert_eq!(state.market_good("market_north", "grain").unwrap().demanded, 0.0);
        assert!(state.market_good("market_south", "grain").unwrap().demanded > 0.0);
    }
}
