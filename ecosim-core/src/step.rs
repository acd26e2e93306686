use crate::ai::run_ai_tick;
use crate::input::Command;
use crate::math::clamp;
use crate::metrics::SimMetrics;
use crate::profiling::frame_mark_tick;
use crate::state::{
    Building, BuildingId, BuildingTypeId, CountryId, EventKind, GoodId, MarketId, RegionId,
    RouteId, TradeRoute, WorldState,
};
use crate::systems::{
    run_buildings_tick, run_consumption_tick, run_demand_tick, run_finance_tick,
    run_pricing_tick, run_production_tick, run_trade_tick,
};
use std::time::{Duration, Instant};
use thiserror::Error;

/// A command rejected by validation. The world is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Unknown country: {0}")]
    UnknownCountry(CountryId),
    #[error("Unknown region: {0}")]
    UnknownRegion(RegionId),
    #[error("Unknown market: {0}")]
    UnknownMarket(MarketId),
    #[error("Unknown good: {0}")]
    UnknownGood(GoodId),
    #[error("Unknown building: {0}")]
    UnknownBuilding(BuildingId),
    #[error("Unknown building type: {0}")]
    UnknownBuildingType(BuildingTypeId),
    #[error("Region {region} is not owned by {country}")]
    NotOwned { region: RegionId, country: CountryId },
    #[error("Region {region} is already owned by {owner}")]
    AlreadyOwned { region: RegionId, owner: CountryId },
    #[error("Insufficient funds: required {required:.2}, available {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("Route source and destination are both {0}")]
    SameMarket(MarketId),
}

/// What a successful command did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Built {
        building_id: BuildingId,
        building_type: BuildingTypeId,
    },
    Toggled {
        building_id: BuildingId,
        enabled: bool,
    },
    RouteAdded {
        route_id: RouteId,
    },
    Annexed {
        region_id: RegionId,
    },
    TaxSet {
        country_id: CountryId,
        rate: f64,
    },
    AiSet {
        enabled: bool,
    },
}

impl std::fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Built {
                building_id,
                building_type,
            } => write!(f, "Built {building_type} ({building_id})"),
            Self::Toggled {
                building_id,
                enabled,
            } => write!(
                f,
                "Building {building_id} {}",
                if *enabled { "enabled" } else { "disabled" }
            ),
            Self::RouteAdded { route_id } => write!(f, "Added route {route_id}"),
            Self::Annexed { region_id } => write!(f, "Annexed {region_id}"),
            Self::TaxSet { rate, .. } => write!(f, "Tax set to {rate:.2}"),
            Self::AiSet { enabled } => write!(f, "AI set to {}", if *enabled { "on" } else { "off" }),
        }
    }
}

/// Advance the world by one tick.
///
/// Systems run in a fixed order; each reads what the previous ones wrote.
pub fn step_tick(state: &mut WorldState) {
    step_tick_inner(state, None);
}

/// Advance the world by `ticks` ticks.
///
/// # Panics
///
/// In debug builds, panics if a tick leaves the world violating an invariant
/// (negative stock, price outside its band, ...). That is always a defect.
pub fn advance(state: &mut WorldState, ticks: u64) {
    for _ in 0..ticks {
        step_tick_inner(state, None);
    }
}

/// Like [`advance`], also recording per-system wall time.
pub fn advance_with_metrics(state: &mut WorldState, ticks: u64, metrics: &mut SimMetrics) {
    let wall_start = Instant::now();
    for _ in 0..ticks {
        step_tick_inner(state, Some(metrics));
    }
    metrics.wall_time += wall_start.elapsed();
}

fn step_tick_inner(state: &mut WorldState, mut metrics: Option<&mut SimMetrics>) {
    let tick_start = Instant::now();

    // 1. Advance tick and clear per-tick accumulators
    state.tick += 1;
    for market in state.markets.values_mut() {
        for good in market.goods.values_mut() {
            good.reset_tick_stats();
        }
    }

    // 2. Run systems in order, timing each when asked
    timed(run_production_tick, state, metrics.as_deref_mut().map(|m| &mut m.production_time));
    timed(run_buildings_tick, state, metrics.as_deref_mut().map(|m| &mut m.buildings_time));
    timed(run_trade_tick, state, metrics.as_deref_mut().map(|m| &mut m.trade_time));
    timed(run_demand_tick, state, metrics.as_deref_mut().map(|m| &mut m.demand_time));
    timed(run_pricing_tick, state, metrics.as_deref_mut().map(|m| &mut m.pricing_time));
    timed(run_consumption_tick, state, metrics.as_deref_mut().map(|m| &mut m.consumption_time));
    timed(run_finance_tick, state, metrics.as_deref_mut().map(|m| &mut m.finance_time));
    timed(run_ai_tick, state, metrics.as_deref_mut().map(|m| &mut m.ai_time));

    if let Some(m) = metrics {
        m.total_ticks += 1;
        m.total_time += tick_start.elapsed();
    }
    frame_mark_tick();

    #[cfg(debug_assertions)]
    if let Err(violation) = state.check_invariants() {
        panic!("invariant violated after tick {}: {}", state.tick, violation);
    }
}

fn timed(system: fn(&mut WorldState), state: &mut WorldState, slot: Option<&mut Duration>) {
    match slot {
        Some(slot) => {
            let start = Instant::now();
            system(state);
            *slot += start.elapsed();
        }
        None => system(state),
    }
}

/// Validates and applies one command.
///
/// Validation completes before anything is written, so an `Err` leaves the
/// world (event log included) exactly as it was.
pub fn execute_command(
    state: &mut WorldState,
    cmd: &Command,
) -> Result<CommandOutcome, ActionError> {
    match cmd {
        Command::Build {
            country,
            region,
            building_type,
            level,
        } => {
            let country_ref = state
                .countries
                .get(country)
                .ok_or_else(|| ActionError::UnknownCountry(country.clone()))?;
            let region_ref = state
                .regions
                .get(region)
                .ok_or_else(|| ActionError::UnknownRegion(region.clone()))?;
            if region_ref.owner.as_deref() != Some(country.as_str()) {
                return Err(ActionError::NotOwned {
                    region: region.clone(),
                    country: country.clone(),
                });
            }
            let ty = state
                .building_types
                .get(building_type)
                .ok_or_else(|| ActionError::UnknownBuildingType(building_type.clone()))?;
            if *level == 0 {
                return Err(ActionError::NonPositive {
                    field: "level",
                    value: 0.0,
                });
            }
            if country_ref.treasury < ty.cost {
                return Err(ActionError::InsufficientFunds {
                    required: ty.cost,
                    available: country_ref.treasury,
                });
            }

            let building_id = place_building(state, country, region, building_type, *level);
            state.add_event(
                EventKind::Build,
                format!("Built {building_type} in {region}"),
                &[
                    ("country_id", country.as_str()),
                    ("building_id", building_id.as_str()),
                ],
            );
            log::info!("{} built {} ({}) in {}", country, building_type, building_id, region);
            Ok(CommandOutcome::Built {
                building_id,
                building_type: building_type.clone(),
            })
        }

        Command::ToggleBuilding { building } => {
            let b = state
                .buildings
                .get_mut(building)
                .ok_or_else(|| ActionError::UnknownBuilding(building.clone()))?;
            b.enabled = !b.enabled;
            let enabled = b.enabled;
            let status = if enabled { "enabled" } else { "disabled" };
            state.add_event(
                EventKind::Build,
                format!("Toggled {building} {status}"),
                &[("building_id", building.as_str())],
            );
            Ok(CommandOutcome::Toggled {
                building_id: building.clone(),
                enabled,
            })
        }

        Command::AddRoute {
            src_market,
            dst_market,
            good,
            capacity,
            tariff,
            transport_cost,
        } => {
            for market in [src_market, dst_market] {
                if !state.markets.contains_key(market) {
                    return Err(ActionError::UnknownMarket(market.clone()));
                }
            }
            if src_market == dst_market {
                return Err(ActionError::SameMarket(src_market.clone()));
            }
            if !state.goods.contains_key(good) {
                return Err(ActionError::UnknownGood(good.clone()));
            }
            for (field, value) in [
                ("capacity", *capacity),
                ("tariff", *tariff),
                ("transport_cost", *transport_cost),
            ] {
                if !value.is_finite() {
                    return Err(ActionError::NotFinite { field });
                }
            }
            if *capacity <= 0.0 {
                return Err(ActionError::NonPositive {
                    field: "capacity",
                    value: *capacity,
                });
            }

            let route_id = open_route(
                state,
                src_market,
                dst_market,
                good,
                *capacity,
                tariff.max(0.0),
                transport_cost.max(0.0),
            );
            state.add_event(
                EventKind::Trade,
                format!("Added route {route_id}"),
                &[("route_id", route_id.as_str()), ("good_id", good.as_str())],
            );
            Ok(CommandOutcome::RouteAdded { route_id })
        }

        Command::Annex { country, region } => {
            let country_ref = state
                .countries
                .get(country)
                .ok_or_else(|| ActionError::UnknownCountry(country.clone()))?;
            let region_ref = state
                .regions
                .get(region)
                .ok_or_else(|| ActionError::UnknownRegion(region.clone()))?;
            if let Some(owner) = &region_ref.owner {
                return Err(ActionError::AlreadyOwned {
                    region: region.clone(),
                    owner: owner.clone(),
                });
            }
            if country_ref.treasury < state.annex_cost {
                return Err(ActionError::InsufficientFunds {
                    required: state.annex_cost,
                    available: country_ref.treasury,
                });
            }

            let country_name = country_ref.name.clone();
            annex_region(state, country, region);
            state.add_event(
                EventKind::Annex,
                format!("Annexed {region} for {country_name}"),
                &[("country_id", country.as_str()), ("region_id", region.as_str())],
            );
            log::info!("{} annexed {}", country, region);
            Ok(CommandOutcome::Annexed {
                region_id: region.clone(),
            })
        }

        Command::SetTaxRate { country, rate } => {
            if !rate.is_finite() {
                return Err(ActionError::NotFinite { field: "rate" });
            }
            let c = state
                .countries
                .get_mut(country)
                .ok_or_else(|| ActionError::UnknownCountry(country.clone()))?;
            c.tax_rate = clamp(*rate, 0.0, 1.0);
            let rate = c.tax_rate;
            let message = format!("Set tax for {} to {:.2}", c.name, rate);
            state.add_event(EventKind::Policy, message, &[("country_id", country.as_str())]);
            Ok(CommandOutcome::TaxSet {
                country_id: country.clone(),
                rate,
            })
        }

        Command::SetAi { enabled } => {
            state.ai_enabled = *enabled;
            let value = if *enabled { "on" } else { "off" };
            state.add_event(EventKind::Ai, format!("AI set to {value}"), &[]);
            Ok(CommandOutcome::AiSet { enabled: *enabled })
        }
    }
}

/// Registers a new building in `region_id` and charges its type's cost to
/// `country_id`. Callers validate ids, ownership and funds beforehand.
pub(crate) fn place_building(
    state: &mut WorldState,
    country_id: &str,
    region_id: &str,
    type_id: &str,
    level: u32,
) -> BuildingId {
    let cost = state.building_types.get(type_id).map_or(0.0, |ty| ty.cost);
    let building_id = state.next_id("bld");
    state.buildings.insert(
        building_id.clone(),
        Building {
            id: building_id.clone(),
            type_id: type_id.to_string(),
            region_id: region_id.to_string(),
            level: level.max(1),
            capacity_multiplier: 1.0,
            enabled: true,
        },
    );
    if let Some(region) = state.regions.get_mut(region_id) {
        region.building_ids.push(building_id.clone());
    }
    if let Some(country) = state.countries.get_mut(country_id) {
        country.treasury = (country.treasury - cost).max(0.0);
    }
    building_id
}

/// Hands an unowned region to `country_id`, charging the annex cost.
pub(crate) fn annex_region(state: &mut WorldState, country_id: &str, region_id: &str) {
    let annex_cost = state.annex_cost;
    let Some(country) = state.countries.get_mut(country_id) else {
        return;
    };
    let Some(region) = state.regions.get_mut(region_id) else {
        return;
    };
    region.owner = Some(country_id.to_string());
    region.market_id = Some(country.market_id.clone());
    country.region_ids.push(region_id.to_string());
    country.treasury = clamp(country.treasury - annex_cost, 0.0, country.treasury);
}

/// Inserts a new route with a fresh id and no recorded flow.
pub(crate) fn open_route(
    state: &mut WorldState,
    src_market: &str,
    dst_market: &str,
    good: &str,
    capacity: f64,
    tariff: f64,
    transport_cost: f64,
) -> RouteId {
    let route_id = state.next_id("route");
    state.routes.insert(
        route_id.clone(),
        TradeRoute {
            id: route_id.clone(),
            src_market_id: src_market.to_string(),
            dst_market_id: dst_market.to_string(),
            good_id: good.to_string(),
            capacity,
            tariff,
            transport_cost,
            last_moved: 0.0,
            last_profit: 0.0,
            last_tariff: 0.0,
        },
    );
    route_id
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
