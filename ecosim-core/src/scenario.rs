//! Built-in content tables and the default two-country world.

use crate::state::{
    Building, BuildingType, BuildingTypeId, Country, GoodDef, GoodId, Market, MarketGood, Pop,
    Region, TradeRoute, WorldState,
};
use std::collections::BTreeMap;

fn good(id: &str, name: &str, base_price: f64, price_k: f64) -> GoodDef {
    GoodDef {
        id: id.to_string(),
        name: name.to_string(),
        base_price,
        price_k,
        min_price_factor: 0.5,
        max_price_factor: 3.0,
    }
}

fn basket(items: &[(&str, f64)]) -> BTreeMap<GoodId, f64> {
    items.iter().map(|(g, a)| ((*g).to_string(), *a)).collect()
}

/// The five tradable goods.
pub fn goods() -> BTreeMap<GoodId, GoodDef> {
    [
        good("logs", "Logs", 2.0, 0.08),
        good("planks", "Planks", 5.0, 0.07),
        good("grain", "Grain", 3.0, 0.06),
        good("tools", "Tools", 12.0, 0.09),
        good("iron", "Iron", 6.0, 0.08),
    ]
    .into_iter()
    .map(|g| (g.id.clone(), g))
    .collect()
}

pub fn building_types() -> BTreeMap<BuildingTypeId, BuildingType> {
    [
        BuildingType {
            id: "lumber_mill".to_string(),
            name: "Lumber Mill".to_string(),
            inputs: basket(&[("logs", 2.0)]),
            outputs: basket(&[("planks", 1.0)]),
            base_capacity: 10.0,
            cost: 40.0,
            upkeep: 1.0,
        },
        BuildingType {
            id: "tool_workshop".to_string(),
            name: "Tool Workshop".to_string(),
            inputs: basket(&[("planks", 2.0), ("iron", 1.0)]),
            outputs: basket(&[("tools", 1.0)]),
            base_capacity: 6.0,
            cost: 70.0,
            upkeep: 2.0,
        },
    ]
    .into_iter()
    .map(|t| (t.id.clone(), t))
    .collect()
}

/// A market carrying every good, with starting prices scaled by `bias`.
fn market(
    goods: &BTreeMap<GoodId, GoodDef>,
    id: &str,
    name: &str,
    country_id: &str,
    bias: &[(&str, f64)],
) -> Market {
    let bias = basket(bias);
    Market {
        id: id.to_string(),
        name: name.to_string(),
        country_id: country_id.to_string(),
        goods: goods
            .iter()
            .map(|(good_id, def)| {
                let factor = bias.get(good_id).copied().unwrap_or(1.0);
                (good_id.clone(), MarketGood::from_def(def, factor))
            })
            .collect(),
    }
}

fn region(id: &str, name: &str, owner: Option<&str>, outputs: &[(&str, f64)]) -> Region {
    let owner = owner.map(str::to_string);
    Region {
        id: id.to_string(),
        name: name.to_string(),
        market_id: owner.as_ref().map(|o| o.replace("country_", "market_")),
        owner,
        outputs: basket(outputs),
        building_ids: Vec::new(),
    }
}

fn building(id: &str, type_id: &str, region_id: &str, level: u32) -> Building {
    Building {
        id: id.to_string(),
        type_id: type_id.to_string(),
        region_id: region_id.to_string(),
        level,
        capacity_multiplier: 1.0,
        enabled: true,
    }
}

fn pop(id: &str, country_id: &str, size: f64, income: f64, cash: f64, needs: &[(&str, f64)]) -> Pop {
    Pop {
        id: id.to_string(),
        country_id: country_id.to_string(),
        size,
        income_per_capita: income,
        cash,
        needs: basket(needs),
        priority: needs.iter().map(|(g, _)| (*g).to_string()).collect(),
        satisfaction: BTreeMap::new(),
        satisfaction_avg: 1.0,
    }
}

fn country(
    id: &str,
    name: &str,
    treasury: f64,
    tax_rate: f64,
    region_ids: &[&str],
    pop_ids: &[&str],
) -> Country {
    Country {
        id: id.to_string(),
        name: name.to_string(),
        market_id: id.replace("country_", "market_"),
        treasury,
        tax_rate,
        region_ids: region_ids.iter().map(|r| (*r).to_string()).collect(),
        pop_ids: pop_ids.iter().map(|p| (*p).to_string()).collect(),
    }
}

fn route(id: &str, good_id: &str, capacity: f64) -> TradeRoute {
    TradeRoute {
        id: id.to_string(),
        src_market_id: "market_north".to_string(),
        dst_market_id: "market_south".to_string(),
        good_id: good_id.to_string(),
        capacity,
        tariff: 0.05,
        transport_cost: 0.2,
        last_moved: 0.0,
        last_profit: 0.0,
        last_tariff: 0.0,
    }
}

/// Northland and Southport, two lumber mills, a tool workshop, two
/// north-to-south routes and one neutral forest. AI governs both countries
/// every second tick.
pub fn default_scenario() -> WorldState {
    let goods = goods();

    let markets = [
        market(
            &goods,
            "market_north",
            "North Market",
            "country_north",
            &[("grain", 0.85), ("planks", 0.9)],
        ),
        market(
            &goods,
            "market_south",
            "South Market",
            "country_south",
            &[("grain", 1.15), ("planks", 1.1)],
        ),
    ];

    let regions = [
        region("north_forest", "North Forest", Some("country_north"), &[("logs", 5.0)]),
        region("north_farm", "North Farm", Some("country_north"), &[("grain", 8.0)]),
        region("south_forest", "South Forest", Some("country_south"), &[("logs", 3.0)]),
        region("south_mine", "South Mine", Some("country_south"), &[("iron", 5.0)]),
        region("south_farm", "South Farm", Some("country_south"), &[("grain", 5.0)]),
        region("frontier_forest", "Frontier Forest", None, &[("logs", 7.0)]),
    ];

    let buildings = [
        building("bld_north_mill", "lumber_mill", "north_forest", 2),
        building("bld_south_mill", "lumber_mill", "south_forest", 1),
        building("bld_south_tools", "tool_workshop", "south_mine", 1),
    ];

    let pops = [
        pop("pop_north", "country_north", 100.0, 1.6, 120.0, &[("grain", 0.08), ("tools", 0.01)]),
        pop("pop_south", "country_south", 120.0, 1.4, 110.0, &[("grain", 0.1), ("tools", 0.015)]),
    ];

    let countries = [
        country(
            "country_north",
            "Northland",
            80.0,
            0.1,
            &["north_forest", "north_farm"],
            &["pop_north"],
        ),
        country(
            "country_south",
            "Southport",
            70.0,
            0.12,
            &["south_forest", "south_mine", "south_farm"],
            &["pop_south"],
        ),
    ];

    let routes = [route("route_grain", "grain", 8.0), route("route_planks", "planks", 6.0)];

    let mut state = WorldState {
        tick: 0,
        goods,
        building_types: building_types(),
        markets: markets.into_iter().map(|m| (m.id.clone(), m)).collect(),
        regions: regions.into_iter().map(|r| (r.id.clone(), r)).collect(),
        buildings: BTreeMap::new(),
        countries: countries.into_iter().map(|c| (c.id.clone(), c)).collect(),
        pops: pops.into_iter().map(|p| (p.id.clone(), p)).collect(),
        routes: routes.into_iter().map(|r| (r.id.clone(), r)).collect(),
        id_counters: [("bld".to_string(), 3), ("route".to_string(), 2)]
            .into_iter()
            .collect(),
        annex_cost: 50.0,
        ai_enabled: true,
        ai_countries: vec!["country_north".to_string(), "country_south".to_string()],
        ai_interval: 2,
        ..WorldState::default()
    };

    for b in buildings {
        if let Some(r) = state.regions.get_mut(&b.region_id) {
            r.building_ids.push(b.id.clone());
        }
        state.buildings.insert(b.id.clone(), b);
    }

    for (market_id, good_id, stock) in [
        ("market_north", "grain", 30.0),
        ("market_north", "logs", 10.0),
        ("market_south", "iron", 8.0),
    ] {
        if let Some(g) = state
            .markets
            .get_mut(market_id)
            .and_then(|m| m.goods.get_mut(good_id))
        {
            g.stock = stock;
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_is_consistent() {
        let state = default_scenario();
        assert!(state.check_invariants().is_ok());

        for country in state.countries.values() {
            assert!(state.markets.contains_key(&country.market_id));
            for region_id in &country.region_ids {
                let region = &state.regions[region_id];
                assert_eq!(region.owner.as_deref(), Some(country.id.as_str()));
                assert_eq!(region.market_id.as_deref(), Some(country.market_id.as_str()));
            }
        }
        for building in state.buildings.values() {
            assert!(state.building_types.contains_key(&building.type_id));
            assert!(state.regions[&building.region_id]
                .building_ids
                .contains(&building.id));
        }
        for market in state.markets.values() {
            assert_eq!(market.goods.len(), 5);
        }
    }

    #[test]
    fn test_default_scenario_contents() {
        let state = default_scenario();

        let grain = state.market_good("market_north", "grain").unwrap();
        assert!((grain.price - 2.55).abs() < 1e-12);
        assert_eq!(grain.stock, 30.0);
        assert!((state.market_good("market_south", "planks").unwrap().price - 5.5).abs() < 1e-12);

        let frontier = state.region("frontier_forest").unwrap();
        assert!(frontier.owner.is_none());
        assert!(frontier.market_id.is_none());

        assert_eq!(state.country("country_north").unwrap().name, "Northland");
        assert_eq!(state.route("route_planks").unwrap().capacity, 6.0);
        assert!(state.ai_enabled);
        assert_eq!(state.ai_interval, 2);
    }

    #[test]
    fn test_fresh_ids_continue_after_content() {
        let mut state = default_scenario();
        assert_eq!(state.next_id("bld"), "bld004");
        assert_eq!(state.next_id("route"), "route003");
    }
}
