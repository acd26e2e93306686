//! Income, taxation and building upkeep.
//!
//! For each country in id order:
//! 1. Every pop earns `income_per_capita × size`; the country keeps `tax_rate` of it.
//! 2. Upkeep of every building in the country's regions is charged.
//!    A treasury that cannot cover it is set to zero and an event is logged.

use crate::state::{EventKind, WorldState};
use tracing::instrument;

/// Total upkeep owed by `country_id`: `Σ upkeep × level` over its regions' buildings.
///
/// Disabled buildings still cost upkeep.
pub fn country_upkeep(state: &WorldState, country_id: &str) -> f64 {
    let Some(country) = state.countries.get(country_id) else {
        return 0.0;
    };
    country
        .region_ids
        .iter()
        .filter_map(|region_id| state.regions.get(region_id))
        .flat_map(|region| region.building_ids.iter())
        .filter_map(|building_id| state.buildings.get(building_id))
        .filter_map(|building| {
            state
                .building_types
                .get(&building.type_id)
                .map(|ty| ty.upkeep * f64::from(building.level))
        })
        .sum()
}

#[instrument(skip_all, name = "finance")]
pub fn run_finance_tick(state: &mut WorldState) {
    let country_ids: Vec<_> = state.countries.keys().cloned().collect();

    for country_id in country_ids {
        let upkeep = country_upkeep(state, &country_id);

        let WorldState {
            countries, pops, ..
        } = &mut *state;
        let Some(country) = countries.get_mut(&country_id) else {
            continue;
        };

        for pop_id in &country.pop_ids {
            let Some(pop) = pops.get_mut(pop_id) else {
                continue;
            };
            let income = pop.income_per_capita * pop.size;
            let tax = income * country.tax_rate;
            pop.cash = (pop.cash + income - tax).max(0.0);
            country.treasury += tax;
        }

        if upkeep <= 0.0 {
            continue;
        }
        if country.treasury >= upkeep {
            country.treasury -= upkeep;
            continue;
        }

        country.treasury = 0.0;
        let message = format!("{} could not cover building upkeep", country.name);
        log::debug!("{} short on upkeep {:.2}", country_id, upkeep);
        state.add_event(EventKind::Finance, message, &[("country_id", country_id.as_str())]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BuildingType;
    use crate::testing::WorldStateBuilder;
    use std::collections::BTreeMap;

    fn mill() -> BuildingType {
        BuildingType {
            id: "mill".into(),
            name: "Mill".into(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            base_capacity: 10.0,
            cost: 40.0,
            upkeep: 1.5,
        }
    }

    fn world(treasury: f64) -> WorldState {
        WorldStateBuilder::new()
            .with_good("grain", 3.0)
            .with_country("north")
            .with_treasury("north", treasury)
            .with_tax_rate("north", 0.25)
            .with_region("farm", Some("north"), &[])
            .with_building_type(mill())
            .with_building("bld001", "mill", "farm", 2)
            .with_pop("p1", "north", 10.0, 2.0, 5.0, &[])
            .build()
    }

    #[test]
    fn test_income_taxed_into_treasury() {
        let mut state = world(100.0);

        run_finance_tick(&mut state);

        // income 20, tax 5, upkeep 1.5 × 2
        assert!((state.pop("p1").unwrap().cash - 20.0).abs() < 1e-12);
        assert!((state.country("north").unwrap().treasury - 102.0).abs() < 1e-12);
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_upkeep_shortfall_zeroes_treasury() {
        let mut state = world(0.0);
        state.countries.get_mut("north").unwrap().tax_rate = 0.0;

        run_finance_tick(&mut state);

        assert_eq!(state.country("north").unwrap().treasury, 0.0);
        let event = state.events().last().unwrap();
        assert_eq!(event.kind, EventKind::Finance);
        assert_eq!(event.message, "north could not cover building upkeep");
    }

    #[test]
    fn test_upkeep_counts_disabled_buildings() {
        let mut state = world(100.0);
        state.buildings.get_mut("bld001").unwrap().enabled = false;
        assert_eq!(country_upkeep(&state, "north"), 3.0);
        assert_eq!(country_upkeep(&state, "nobody"), 0.0);

        run_finance_tick(&mut state);
        assert!((state.country("north").unwrap().treasury - 102.0).abs() < 1e-12);
    }
}
