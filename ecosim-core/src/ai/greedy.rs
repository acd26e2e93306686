use crate::ai::heuristics::{
    country_satisfaction, import_export_profit, region_value, shortage_ratio, shortage_scores,
    ASSUMED_TARIFF, ASSUMED_TRANSPORT_COST,
};
use crate::ai::AiPlayer;
use crate::math::clamp;
use crate::state::{EventKind, MarketId, WorldState};
use crate::step::{annex_region, open_route, place_building};

// Tax policy
pub const TAX_STEP: f64 = 0.02;
pub const TAX_MIN: f64 = 0.05;
pub const TAX_MAX: f64 = 0.35;
pub const TAX_MIN_CHANGE: f64 = 0.005;
pub const LOW_SATISFACTION: f64 = 0.75;
pub const HIGH_SATISFACTION: f64 = 0.95;
/// Below this treasury a content country raises revenue.
pub const LOW_TREASURY: f64 = 120.0;

// Tariff policy
pub const SHORTAGE_RATIO: f64 = 1.2;
pub const GLUT_RATIO: f64 = 0.8;
pub const TARIFF_CUT: f64 = 0.02;
pub const TARIFF_RAISE: f64 = 0.01;
pub const TARIFF_REVENUE_RAISE: f64 = 0.005;
pub const TARIFF_MAX: f64 = 0.2;
pub const TARIFF_MIN_CHANGE: f64 = 0.001;

// Construction, trade and annexation
pub const BUILD_SCORE_THRESHOLD: f64 = 1.2;
pub const ROUTE_CAPACITY: f64 = 8.0;
pub const MIN_ROUTE_PROFIT: f64 = 0.5;
pub const ANNEX_VALUE_THRESHOLD: f64 = 10.0;

/// A deterministic, threshold-driven economic AI.
///
/// Each call to [`AiPlayer::act`] runs five independent decisions in a fixed
/// order: tax, tariffs, construction, trade routes, annexation. Every decision
/// may no-op and none of them spends money the country does not have.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyAi;

impl GreedyAi {
    pub fn new() -> Self {
        Self
    }

    /// Nudges the tax rate toward keeping pops content and the treasury afloat.
    pub fn adjust_tax(&self, state: &mut WorldState, country_id: &str) {
        let satisfaction = country_satisfaction(state, country_id);
        let Some(country) = state.countries.get_mut(country_id) else {
            return;
        };

        let old = country.tax_rate;
        let mut rate = old;
        if satisfaction < LOW_SATISFACTION {
            rate -= TAX_STEP;
        } else if satisfaction > HIGH_SATISFACTION && country.treasury < LOW_TREASURY {
            rate += TAX_STEP;
        }
        let rate = clamp(rate, TAX_MIN, TAX_MAX);
        if (rate - old).abs() < TAX_MIN_CHANGE {
            return;
        }

        country.tax_rate = rate;
        let message = format!("{} set tax to {:.2}", country.name, rate);
        state.add_event(EventKind::AiTax, message, &[("country_id", country_id)]);
    }

    /// Retunes tariffs on routes importing into the country's market.
    pub fn adjust_tariffs(&self, state: &mut WorldState, country_id: &str) {
        let Some(country) = state.countries.get(country_id) else {
            return;
        };
        let market_id = country.market_id.clone();
        let name = country.name.clone();
        let wants_revenue = country.treasury < LOW_TREASURY
            && country_satisfaction(state, country_id) > HIGH_SATISFACTION;

        let changes: Vec<_> = state
            .routes
            .values()
            .filter(|route| route.dst_market_id == market_id)
            .filter_map(|route| {
                let good = state.market_good(&market_id, &route.good_id)?;
                let ratio = shortage_ratio(good);
                let mut tariff = route.tariff;
                if ratio > SHORTAGE_RATIO {
                    tariff -= TARIFF_CUT;
                } else if ratio < GLUT_RATIO {
                    tariff += TARIFF_RAISE;
                } else if wants_revenue {
                    tariff += TARIFF_REVENUE_RAISE;
                }
                let tariff = clamp(tariff, 0.0, TARIFF_MAX);
                ((tariff - route.tariff).abs() >= TARIFF_MIN_CHANGE)
                    .then(|| (route.id.clone(), tariff))
            })
            .collect();

        for (route_id, tariff) in changes {
            if let Some(route) = state.routes.get_mut(&route_id) {
                route.tariff = tariff;
            }
            state.add_event(
                EventKind::AiTariff,
                format!("{name} set tariff on {route_id} to {tariff:.3}"),
                &[("country_id", country_id), ("route_id", route_id.as_str())],
            );
        }
    }

    /// Builds the cheapest producer of the most short good, if affordable.
    pub fn maybe_build(&self, state: &mut WorldState, country_id: &str) {
        let scores = shortage_scores(state, country_id);
        // First maximum in good-id order
        let Some((target_good, score)) = scores
            .iter()
            .fold(None, |best: Option<(&String, f64)>, (good, &score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((good, score)),
            })
        else {
            return;
        };
        if score < BUILD_SCORE_THRESHOLD {
            return;
        }

        let Some(building_type) = state
            .building_types
            .values()
            .filter(|ty| ty.outputs.get(target_good).is_some_and(|&amount| amount > 0.0))
            .fold(None, |cheapest: Option<&crate::state::BuildingType>, ty| match cheapest {
                Some(c) if c.cost <= ty.cost => Some(c),
                _ => Some(ty),
            })
        else {
            return;
        };
        let Some(country) = state.countries.get(country_id) else {
            return;
        };
        if country.treasury < building_type.cost {
            return;
        }
        let Some(region_id) = country.region_ids.first().cloned() else {
            return;
        };

        let type_id = building_type.id.clone();
        let name = country.name.clone();
        let building_id = place_building(state, country_id, &region_id, &type_id, 1);
        log::debug!("AI {} builds {} for {}", country_id, type_id, target_good);
        state.add_event(
            EventKind::AiBuild,
            format!("{name} built {type_id} in {region_id}"),
            &[
                ("country_id", country_id),
                ("building_id", building_id.as_str()),
            ],
        );
    }

    /// Keeps one route per good pointed in the most profitable direction.
    pub fn maybe_trade(&self, state: &mut WorldState, country_id: &str) {
        let Some(country) = state.countries.get(country_id) else {
            return;
        };
        let Some(own) = state.markets.get(&country.market_id) else {
            return;
        };
        let name = country.name.clone();

        let mut best: Option<(MarketId, MarketId, String)> = None;
        let mut best_profit = 0.0;
        for (good_id, own_good) in &own.goods {
            for other in state.markets.values().filter(|m| m.id != own.id) {
                let Some(other_good) = other.goods.get(good_id) else {
                    continue;
                };
                let (import, export) = import_export_profit(own_good.price, other_good.price);
                if import > MIN_ROUTE_PROFIT && import > best_profit {
                    best = Some((other.id.clone(), own.id.clone(), good_id.clone()));
                    best_profit = import;
                }
                if export > MIN_ROUTE_PROFIT && export > best_profit {
                    best = Some((own.id.clone(), other.id.clone(), good_id.clone()));
                    best_profit = export;
                }
            }
        }
        let Some((src, dst, good_id)) = best else {
            return;
        };
        let own_id = own.id.clone();

        let existing = state
            .routes
            .values()
            .find(|route| route.good_id == good_id && route.touches(&own_id))
            .map(|route| (route.id.clone(), route.src_market_id == src && route.dst_market_id == dst));

        match existing {
            Some((_, true)) => {}
            Some((route_id, false)) => {
                if let Some(route) = state.routes.get_mut(&route_id) {
                    route.src_market_id = src;
                    route.dst_market_id = dst;
                    route.clear_flow();
                }
                state.add_event(
                    EventKind::AiTrade,
                    format!("{name} retargeted route {route_id} for {good_id}"),
                    &[("country_id", country_id), ("route_id", route_id.as_str())],
                );
            }
            None => {
                let route_id = open_route(
                    state,
                    &src,
                    &dst,
                    &good_id,
                    ROUTE_CAPACITY,
                    ASSUMED_TARIFF,
                    ASSUMED_TRANSPORT_COST,
                );
                state.add_event(
                    EventKind::AiTrade,
                    format!("{name} added route {route_id} for {good_id}"),
                    &[("country_id", country_id), ("route_id", route_id.as_str())],
                );
            }
        }
    }

    /// Annexes the most valuable neutral region when the treasury allows.
    pub fn maybe_annex(&self, state: &mut WorldState, country_id: &str) {
        let Some(country) = state.countries.get(country_id) else {
            return;
        };
        if country.treasury < state.annex_cost {
            return;
        }
        let name = country.name.clone();

        let Some((region_id, value)) = state
            .regions
            .values()
            .filter(|region| region.owner.is_none())
            .map(|region| (region.id.clone(), region_value(state, &region.id)))
            .fold(None, |best: Option<(String, f64)>, (id, value)| match best {
                Some((_, best_value)) if best_value >= value => best,
                _ => Some((id, value)),
            })
        else {
            return;
        };
        if value < ANNEX_VALUE_THRESHOLD {
            return;
        }

        annex_region(state, country_id, &region_id);
        log::debug!("AI {} annexes {} (value {:.1})", country_id, region_id, value);
        state.add_event(
            EventKind::AiAnnex,
            format!("{name} annexed {region_id}"),
            &[("country_id", country_id), ("region_id", region_id.as_str())],
        );
    }
}

impl AiPlayer for GreedyAi {
    fn act(&self, state: &mut WorldState, country_id: &str) {
        self.adjust_tax(state, country_id);
        self.adjust_tariffs(state, country_id);
        self.maybe_build(state, country_id);
        self.maybe_trade(state, country_id);
        self.maybe_annex(state, country_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BuildingType;
    use crate::testing::WorldStateBuilder;

    fn lumber_mill(cost: f64) -> BuildingType {
        BuildingType {
            id: "lumber_mill".into(),
            name: "Lumber Mill".into(),
            inputs: [("logs".to_string(), 2.0)].into_iter().collect(),
            outputs: [("planks".to_string(), 1.0)].into_iter().collect(),
            base_capacity: 10.0,
            cost,
            upkeep: 1.0,
        }
    }

    fn two_markets() -> WorldStateBuilder {
        WorldStateBuilder::new()
            .with_good("grain", 3.0)
            .with_country("north")
            .with_country("south")
    }

    fn set_satisfaction(state: &mut WorldState, pop: &str, value: f64) {
        state.pops.get_mut(pop).unwrap().satisfaction_avg = value;
    }

    fn set_demanded(state: &mut WorldState, market: &str, good: &str, demanded: f64) {
        let markets = &mut state.markets;
        markets.get_mut(market).unwrap().goods.get_mut(good).unwrap().demanded = demanded;
    }

    #[test]
    fn test_tax_lowered_when_unhappy() {
        let mut state = two_markets()
            .with_tax_rate("north", 0.2)
            .with_pop("p1", "north", 10.0, 1.0, 1.0, &[])
            .build();
        set_satisfaction(&mut state, "p1", 0.5);

        GreedyAi.adjust_tax(&mut state, "north");

        assert!((state.countries["north"].tax_rate - 0.18).abs() < 1e-12);
        assert_eq!(state.events().last().unwrap().kind, EventKind::AiTax);
    }

    #[test]
    fn test_tax_raised_when_content_and_poor() {
        let mut state = two_markets()
            .with_treasury("north", 50.0)
            .with_pop("p1", "north", 10.0, 1.0, 1.0, &[])
            .build();

        GreedyAi.adjust_tax(&mut state, "north");

        assert!((state.countries["north"].tax_rate - 0.12).abs() < 1e-12);
    }

    #[test]
    fn test_tax_unchanged_when_rich_and_content() {
        let mut state = two_markets()
            .with_treasury("north", 500.0)
            .with_pop("p1", "north", 10.0, 1.0, 1.0, &[])
            .build();

        GreedyAi.adjust_tax(&mut state, "north");

        assert_eq!(state.countries["north"].tax_rate, 0.1);
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_tax_small_change_suppressed() {
        let mut state = two_markets()
            .with_treasury("north", 50.0)
            .with_tax_rate("north", 0.349)
            .with_pop("p1", "north", 10.0, 1.0, 1.0, &[])
            .build();

        GreedyAi.adjust_tax(&mut state, "north");

        // 0.369 clamps to 0.35, only 0.001 away
        assert_eq!(state.countries["north"].tax_rate, 0.349);
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_tax_clamped_to_band() {
        let mut state = two_markets()
            .with_tax_rate("north", 0.06)
            .with_pop("p1", "north", 10.0, 1.0, 1.0, &[])
            .build();
        set_satisfaction(&mut state, "p1", 0.1);

        GreedyAi.adjust_tax(&mut state, "north");

        // 0.04 clamps back to 0.05: a change of 0.01 still applies
        assert!((state.countries["north"].tax_rate - TAX_MIN).abs() < 1e-12);
    }

    #[test]
    fn test_tariff_cut_on_shortage() {
        let mut state = two_markets()
            .with_stock("market_north", "grain", 1.0)
            .with_route("r1", "market_south", "market_north", "grain", 8.0, 0.05, 0.2)
            .with_route("r2", "market_north", "market_south", "grain", 8.0, 0.05, 0.2)
            .build();
        state
            .markets
            .get_mut("market_north")
            .unwrap()
            .goods
            .get_mut("grain")
            .unwrap()
            .demanded = 10.0;

        GreedyAi.adjust_tariffs(&mut state, "north");

        assert!((state.routes["r1"].tariff - 0.03).abs() < 1e-12);
        // export route untouched
        assert_eq!(state.routes["r2"].tariff, 0.05);
    }

    #[test]
    fn test_tariff_raised_on_glut() {
        let mut state = two_markets()
            .with_treasury("north", 500.0)
            .with_stock("market_north", "grain", 100.0)
            .with_route("r1", "market_south", "market_north", "grain", 8.0, 0.195, 0.2)
            .build();

        GreedyAi.adjust_tariffs(&mut state, "north");

        // capped at 0.2; change 0.005 >= 0.001
        assert!((state.routes["r1"].tariff - TARIFF_MAX).abs() < 1e-12);
        assert_eq!(state.events().last().unwrap().kind, EventKind::AiTariff);
    }

    #[test]
    fn test_tariff_small_change_suppressed() {
        let mut state = two_markets()
            .with_treasury("north", 500.0)
            .with_stock("market_north", "grain", 100.0)
            .with_route("r1", "market_south", "market_north", "grain", 8.0, 0.1995, 0.2)
            .build();

        GreedyAi.adjust_tariffs(&mut state, "north");

        assert_eq!(state.routes["r1"].tariff, 0.1995);
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_tariff_revenue_raise_when_content_and_poor() {
        let mut state = two_markets()
            .with_stock("market_north", "grain", 10.0)
            .with_route("r1", "market_south", "market_north", "grain", 8.0, 0.05, 0.2)
            .with_pop("p1", "north", 10.0, 1.0, 1.0, &[])
            .build();
        set_demanded(&mut state, "market_north", "grain", 10.0);

        GreedyAi.adjust_tariffs(&mut state, "north");

        assert!((state.routes["r1"].tariff - 0.055).abs() < 1e-12);
        let event = state.events().last().unwrap();
        assert_eq!(event.kind, EventKind::AiTariff);
        assert_eq!(event.payload["route_id"], "r1");
    }

    #[test]
    fn test_tariff_balanced_market_left_alone_when_rich() {
        let mut state = two_markets()
            .with_treasury("north", 500.0)
            .with_stock("market_north", "grain", 10.0)
            .with_route("r1", "market_south", "market_north", "grain", 8.0, 0.05, 0.2)
            .build();
        set_demanded(&mut state, "market_north", "grain", 10.0);

        GreedyAi.adjust_tariffs(&mut state, "north");

        assert_eq!(state.routes["r1"].tariff, 0.05);
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_build_targets_short_good() {
        let mut state = WorldStateBuilder::new()
            .with_good("logs", 2.0)
            .with_good("planks", 5.0)
            .with_country("north")
            .with_region("forest", Some("north"), &[])
            .with_building_type(lumber_mill(40.0))
            .with_price("market_north", "planks", 10.0)
            .build();

        GreedyAi.maybe_build(&mut state, "north");

        assert_eq!(state.buildings.len(), 1);
        let building = state.buildings.values().next().unwrap();
        assert_eq!(building.id, "bld001");
        assert_eq!(building.region_id, "forest");
        assert_eq!(building.level, 1);
        assert_eq!(state.countries["north"].treasury, 60.0);
        assert_eq!(state.regions["forest"].building_ids, vec!["bld001".to_string()]);
    }

    #[test]
    fn test_build_picks_cheapest_producer() {
        let mut state = WorldStateBuilder::new()
            .with_good("logs", 2.0)
            .with_good("planks", 5.0)
            .with_country("north")
            .with_region("forest", Some("north"), &[])
            .with_building_type(lumber_mill(40.0))
            .with_building_type(BuildingType {
                id: "timber_yard".into(),
                ..lumber_mill(30.0)
            })
            .with_building_type(BuildingType {
                id: "sawmill".into(),
                ..lumber_mill(30.0)
            })
            .with_price("market_north", "planks", 10.0)
            .build();

        GreedyAi.maybe_build(&mut state, "north");

        // equal costs resolve to the first type id
        let building = state.buildings.values().next().unwrap();
        assert_eq!(building.type_id, "sawmill");
        assert_eq!(state.countries["north"].treasury, 70.0);
    }

    #[test]
    fn test_build_requires_funds() {
        let mut state = WorldStateBuilder::new()
            .with_good("logs", 2.0)
            .with_good("planks", 5.0)
            .with_country("north")
            .with_treasury("north", 10.0)
            .with_region("forest", Some("north"), &[])
            .with_building_type(lumber_mill(40.0))
            .with_price("market_north", "planks", 10.0)
            .build();

        GreedyAi.maybe_build(&mut state, "north");

        assert!(state.buildings.is_empty());
        assert_eq!(state.countries["north"].treasury, 10.0);
    }

    #[test]
    fn test_build_skipped_below_threshold() {
        // every score is exactly 1.0 at base prices with no unmet need
        let mut state = WorldStateBuilder::new()
            .with_good("logs", 2.0)
            .with_good("planks", 5.0)
            .with_country("north")
            .with_region("forest", Some("north"), &[])
            .with_building_type(lumber_mill(40.0))
            .build();

        GreedyAi.maybe_build(&mut state, "north");

        assert!(state.buildings.is_empty());
    }

    #[test]
    fn test_trade_opens_import_route() {
        let mut state = two_markets()
            .with_price("market_north", "grain", 8.0)
            .with_price("market_south", "grain", 2.0)
            .build();

        GreedyAi.maybe_trade(&mut state, "north");

        let route = state.route("route001").unwrap();
        assert_eq!(route.src_market_id, "market_south");
        assert_eq!(route.dst_market_id, "market_north");
        assert_eq!(route.capacity, ROUTE_CAPACITY);
        assert_eq!(route.tariff, ASSUMED_TARIFF);
        assert_eq!(state.events().last().unwrap().kind, EventKind::AiTrade);
    }

    #[test]
    fn test_trade_retargets_existing_route() {
        let mut state = two_markets()
            .with_price("market_north", "grain", 2.0)
            .with_price("market_south", "grain", 8.0)
            .with_route("route_grain", "market_south", "market_north", "grain", 6.0, 0.1, 0.3)
            .build();

        GreedyAi.maybe_trade(&mut state, "north");

        assert_eq!(state.routes.len(), 1);
        let route = state.route("route_grain").unwrap();
        assert_eq!(route.src_market_id, "market_north");
        assert_eq!(route.dst_market_id, "market_south");
        assert_eq!(route.capacity, 6.0);
    }

    #[test]
    fn test_trade_leaves_matching_route() {
        let mut state = two_markets()
            .with_price("market_north", "grain", 2.0)
            .with_price("market_south", "grain", 8.0)
            .with_route("route_grain", "market_north", "market_south", "grain", 6.0, 0.1, 0.3)
            .build();
        let before = state.checksum();

        GreedyAi.maybe_trade(&mut state, "north");

        assert_eq!(state.checksum(), before);
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_annex_most_valuable_neutral_region() {
        let mut state = WorldStateBuilder::new()
            .with_good("logs", 2.0)
            .with_country("north")
            .with_region("small", None, &[("logs", 6.0)])
            .with_region("large", None, &[("logs", 7.0)])
            .build();

        GreedyAi.maybe_annex(&mut state, "north");

        assert_eq!(state.regions["large"].owner.as_deref(), Some("north"));
        assert_eq!(state.regions["large"].market_id.as_deref(), Some("market_north"));
        assert!(state.regions["small"].owner.is_none());
        assert_eq!(state.countries["north"].treasury, 50.0);
    }

    #[test]
    fn test_annex_tie_goes_to_lowest_region_id() {
        let mut state = WorldStateBuilder::new()
            .with_good("logs", 2.0)
            .with_country("north")
            .with_region("west_vale", None, &[("logs", 7.0)])
            .with_region("east_vale", None, &[("logs", 7.0)])
            .build();

        GreedyAi.maybe_annex(&mut state, "north");

        assert_eq!(state.regions["east_vale"].owner.as_deref(), Some("north"));
        assert!(state.regions["west_vale"].owner.is_none());
        assert_eq!(state.events().last().unwrap().payload["region_id"], "east_vale");
    }

    #[test]
    fn test_annex_skips_low_value() {
        let mut state = WorldStateBuilder::new()
            .with_good("logs", 2.0)
            .with_country("north")
            .with_region("bog", None, &[("logs", 4.0)])
            .build();

        GreedyAi.maybe_annex(&mut state, "north");

        assert!(state.regions["bog"].owner.is_none());
    }

    #[test]
    fn test_broke_country_stays_solvent() {
        let mut state = WorldStateBuilder::new()
            .with_good("logs", 2.0)
            .with_good("planks", 5.0)
            .with_country("north")
            .with_country("south")
            .with_treasury("north", 0.0)
            .with_region("forest", Some("north"), &[])
            .with_region("frontier", None, &[("logs", 7.0)])
            .with_building_type(lumber_mill(40.0))
            .with_price("market_north", "planks", 10.0)
            .build();

        GreedyAi.act(&mut state, "north");

        assert!(state.countries["north"].treasury >= 0.0);
        assert!(state.buildings.is_empty());
        assert!(state.regions["frontier"].owner.is_none());
    }
}
