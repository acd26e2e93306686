//! Plain-text views of the world for the terminal.

use ecosim_core::ai::heuristics::country_satisfaction;
use ecosim_core::WorldState;
use std::fmt::Write;

/// One-line summary of a country, `None` if it does not exist.
pub fn status_line(state: &WorldState, country_id: &str) -> Option<String> {
    let country = state.country(country_id)?;
    Some(format!(
        "Tick {} | {} | treasury {:.2} | tax {:.2} | satisfaction {:.2} | regions {}",
        state.tick,
        country.name,
        country.treasury,
        country.tax_rate,
        country_satisfaction(state, country_id),
        country.region_ids.len(),
    ))
}

/// Per-good table of one market, `None` if it does not exist.
pub fn market_table(state: &WorldState, market_id: &str) -> Option<String> {
    let market = state.market(market_id)?;
    let mut out = String::new();
    let _ = writeln!(out, "Market: {}", market.name);
    let _ = writeln!(
        out,
        "  {:<8} {:>8} {:>9} {:>9} {:>9} {:>8} {:>8}",
        "good", "price", "stock", "produced", "demanded", "bought", "unmet"
    );
    for (good_id, good) in &market.goods {
        let _ = writeln!(
            out,
            "  {:<8} {:>8.2} {:>9.2} {:>9.2} {:>9.2} {:>8.2} {:>8.2}",
            good_id, good.price, good.stock, good.produced, good.demanded, good.bought, good.unmet
        );
    }
    Some(out)
}

pub fn routes_table(state: &WorldState) -> String {
    let mut out = String::from("Trade routes:\n");
    if state.routes.is_empty() {
        out.push_str("  (none)\n");
    }
    for route in state.routes.values() {
        let _ = writeln!(
            out,
            "  {:<13} {} -> {} {:<7} cap {:>5.1} moved {:>6.2} profit {:>7.2} tariff {:>6.2}",
            route.id,
            route.src_market_id,
            route.dst_market_id,
            route.good_id,
            route.capacity,
            route.last_moved,
            route.last_profit,
            route.last_tariff,
        );
    }
    out
}

pub fn markets_list(state: &WorldState) -> String {
    let mut out = String::from("Markets:\n");
    for market in state.markets.values() {
        let _ = writeln!(out, "- {} ({}) country {}", market.id, market.name, market.country_id);
    }
    out
}

pub fn goods_list(state: &WorldState) -> String {
    let mut out = String::from("Goods:\n");
    for good in state.goods.values() {
        let _ = writeln!(out, "- {} ({}) base price {:.2}", good.id, good.name, good.base_price);
    }
    out
}

pub fn regions_list(state: &WorldState) -> String {
    let mut out = String::from("Regions:\n");
    for region in state.regions.values() {
        let _ = writeln!(
            out,
            "- {} ({}) owner {}",
            region.id,
            region.name,
            region.owner.as_deref().unwrap_or("neutral")
        );
    }
    out
}

/// Owner, base outputs and buildings of one region, `None` if it does not exist.
pub fn region_detail(state: &WorldState, region_id: &str) -> Option<String> {
    let region = state.region(region_id)?;
    let outputs: Vec<String> = region
        .outputs
        .iter()
        .map(|(good, amount)| format!("{good}:{amount:.1}"))
        .collect();
    let buildings = if region.building_ids.is_empty() {
        "none".to_string()
    } else {
        region.building_ids.join(", ")
    };
    Some(format!(
        "{} ({}) owner {} outputs [{}] buildings [{}]\n",
        region.id,
        region.name,
        region.owner.as_deref().unwrap_or("neutral"),
        outputs.join(", "),
        buildings
    ))
}

pub fn buildings_list(state: &WorldState) -> String {
    let mut out = String::from("Buildings:\n");
    if state.buildings.is_empty() {
        out.push_str("  (none)\n");
    }
    for building in state.buildings.values() {
        let region = state
            .region(&building.region_id)
            .map_or(building.region_id.as_str(), |r| r.name.as_str());
        let _ = writeln!(
            out,
            "- {} {} region {} lvl {} {}",
            building.id,
            building.type_id,
            region,
            building.level,
            if building.enabled { "on" } else { "off" }
        );
    }
    out
}

/// The newest `n` events, oldest first.
pub fn recent_events(state: &WorldState, n: usize) -> String {
    let mut out = String::from("Recent events:\n");
    if state.events().is_empty() {
        out.push_str("  (none)\n");
    }
    for event in state.events().recent(n) {
        let _ = writeln!(out, "  [{:>4}] {:<10} {}", event.tick, event.kind, event.message);
    }
    out
}

/// Status of every country, the selected country's market, routes and events.
pub fn full_report(state: &WorldState, selected: &str, events: usize) -> String {
    let mut out = String::new();
    for country_id in state.countries.keys() {
        if let Some(line) = status_line(state, country_id) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    if let Some(table) = state
        .country(selected)
        .and_then(|c| market_table(state, &c.market_id))
    {
        out.push_str(&table);
    }
    out.push_str(&routes_table(state));
    out.push_str(&recent_events(state, events));
    out
}
