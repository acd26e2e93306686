//! Consumption: pops buy from their home market in priority order.
//!
//! Goods earlier in a pop's priority list get the first claim on its cash and
//! on market stock. Shortfalls accumulate into the market's `unmet`.

use crate::math::safe_div;
use crate::rules::affordable_purchase;
use crate::state::WorldState;
use tracing::instrument;

#[instrument(skip_all, name = "consumption")]
pub fn run_consumption_tick(state: &mut WorldState) {
    let WorldState {
        pops,
        countries,
        markets,
        ..
    } = state;

    for pop in pops.values_mut() {
        let Some(market) = countries
            .get(&pop.country_id)
            .and_then(|c| markets.get_mut(&c.market_id))
        else {
            log::warn!("Pop {} has no home market", pop.id);
            continue;
        };

        let mut total = 0.0;
        let mut count = 0u32;
        for good_id in &pop.priority {
            let need = pop.needs.get(good_id).copied().unwrap_or(0.0) * pop.size;
            if need <= 0.0 {
                continue;
            }
            let Some(good) = market.goods.get_mut(good_id) else {
                continue;
            };

            let bought = affordable_purchase(need, good.price, good.stock, pop.cash);
            if bought > 0.0 {
                pop.cash = (pop.cash - bought * good.price).max(0.0);
                good.stock = (good.stock - bought).max(0.0);
                good.bought += bought;
            }
            let unmet = need - bought;
            if unmet > 0.0 {
                good.unmet += unmet;
            }

            let satisfaction = safe_div(bought, need, 1.0);
            pop.satisfaction.insert(good_id.clone(), satisfaction);
            total += satisfaction;
            count += 1;
        }

        pop.satisfaction_avg = safe_div(total, f64::from(count), 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::WorldStateBuilder;

    #[test]
    fn test_full_supply_satisfies() {
        let mut state = WorldStateBuilder::new()
            .with_good("grain", 3.0)
            .with_country("north")
            .with_stock("market_north", "grain", 100.0)
            .with_pop("p1", "north", 100.0, 1.0, 100.0, &[("grain", 0.1)])
            .build();

        run_consumption_tick(&mut state);

        let pop = state.pop("p1").unwrap();
        let grain = state.market_good("market_north", "grain").unwrap();
        assert!((pop.cash - 70.0).abs() < 1e-12);
        assert!((grain.stock - 90.0).abs() < 1e-12);
        assert!((grain.bought - 10.0).abs() < 1e-12);
        assert_eq!(grain.unmet, 0.0);
        assert_eq!(pop.satisfaction_avg, 1.0);
    }

    #[test]
    fn test_scarcity_records_unmet_exactly() {
        let mut state = WorldStateBuilder::new()
            .with_good("grain", 3.0)
            .with_country("north")
            .with_stock("market_north", "grain", 4.0)
            .with_pop("p1", "north", 100.0, 1.0, 100.0, &[("grain", 0.1)])
            .build();

        run_consumption_tick(&mut state);

        let pop = state.pop("p1").unwrap();
        let grain = state.market_good("market_north", "grain").unwrap();
        let need = 10.0;
        assert_eq!(grain.bought, 4.0);
        assert!((grain.unmet - (need - grain.bought)).abs() < 1e-12);
        assert!((pop.satisfaction["grain"] - grain.bought / need).abs() < 1e-12);
        assert_eq!(grain.stock, 0.0);
    }

    #[test]
    fn test_cash_limits_purchase() {
        let mut state = WorldStateBuilder::new()
            .with_good("grain", 3.0)
            .with_country("north")
            .with_stock("market_north", "grain", 100.0)
            .with_pop("p1", "north", 100.0, 1.0, 6.0, &[("grain", 0.1)])
            .build();

        run_consumption_tick(&mut state);

        let pop = state.pop("p1").unwrap();
        assert_eq!(pop.cash, 0.0);
        assert!((state.market_good("market_north", "grain").unwrap().bought - 2.0).abs() < 1e-12);
        assert!((pop.satisfaction_avg - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_priority_order_gets_first_claim() {
        // Cash covers only the first good in the priority list
        let mut state = WorldStateBuilder::new()
            .with_good("grain", 3.0)
            .with_good("tools", 12.0)
            .with_country("north")
            .with_stock("market_north", "grain", 100.0)
            .with_stock("market_north", "tools", 100.0)
            .with_pop("p1", "north", 100.0, 1.0, 30.0, &[("tools", 0.01), ("grain", 0.1)])
            .build();

        run_consumption_tick(&mut state);

        let pop = state.pop("p1").unwrap();
        assert_eq!(pop.satisfaction["tools"], 1.0);
        assert!((pop.satisfaction["grain"] - 0.6).abs() < 1e-12);
        assert!((pop.satisfaction_avg - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_no_needs_defaults_satisfaction() {
        let mut state = WorldStateBuilder::new()
            .with_good("grain", 3.0)
            .with_country("north")
            .with_pop("p1", "north", 100.0, 1.0, 10.0, &[("grain", 0.0)])
            .build();
        state.pops.get_mut("p1").unwrap().satisfaction_avg = 0.3;

        run_consumption_tick(&mut state);

        assert_eq!(state.pop("p1").unwrap().satisfaction_avg, 1.0);
    }
}
