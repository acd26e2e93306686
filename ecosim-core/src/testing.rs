//! Fixture builder for hand-made worlds in tests and benchmarks.
//!
//! Countries created with `with_country("north")` get id `north` and a market
//! `market_north`. Every market carries every registered good; stock and
//! price overrides are applied in [`WorldStateBuilder::build`], so call order
//! does not matter.

use crate::state::{
    Building, BuildingType, Country, GoodDef, Market, MarketGood, Pop, Region, TradeRoute,
    WorldState,
};
use std::collections::BTreeMap;

pub struct WorldStateBuilder {
    state: WorldState,
    stocks: Vec<(String, String, f64)>,
    prices: Vec<(String, String, f64)>,
}

impl WorldStateBuilder {
    pub fn new() -> Self {
        Self {
            state: WorldState::default(),
            stocks: Vec::new(),
            prices: Vec::new(),
        }
    }

    pub fn tick(mut self, tick: u64) -> Self {
        self.state.tick = tick;
        self
    }

    /// Registers a good with price_k 0.08 and a [0.5, 3.0] price band.
    pub fn with_good(self, id: &str, base_price: f64) -> Self {
        self.with_good_def(GoodDef {
            id: id.to_string(),
            name: id.to_string(),
            base_price,
            price_k: 0.08,
            min_price_factor: 0.5,
            max_price_factor: 3.0,
        })
    }

    pub fn with_good_def(mut self, def: GoodDef) -> Self {
        self.state.goods.insert(def.id.clone(), def);
        self
    }

    /// Adds a country with treasury 100 and tax rate 0.1, plus its market.
    pub fn with_country(mut self, id: &str) -> Self {
        let market_id = format!("market_{id}");
        self.state.markets.insert(
            market_id.clone(),
            Market {
                id: market_id.clone(),
                name: format!("{id} market"),
                country_id: id.to_string(),
                goods: BTreeMap::new(),
            },
        );
        self.state.countries.insert(
            id.to_string(),
            Country {
                id: id.to_string(),
                name: id.to_string(),
                market_id,
                treasury: 100.0,
                tax_rate: 0.1,
                region_ids: Vec::new(),
                pop_ids: Vec::new(),
            },
        );
        self
    }

    pub fn with_treasury(mut self, country: &str, treasury: f64) -> Self {
        if let Some(c) = self.state.countries.get_mut(country) {
            c.treasury = treasury;
        }
        self
    }

    pub fn with_tax_rate(mut self, country: &str, tax_rate: f64) -> Self {
        if let Some(c) = self.state.countries.get_mut(country) {
            c.tax_rate = tax_rate;
        }
        self
    }

    /// Adds a region; an owned region joins its owner's region list and market.
    pub fn with_region(mut self, id: &str, owner: Option<&str>, outputs: &[(&str, f64)]) -> Self {
        let market_id = owner
            .and_then(|o| self.state.countries.get_mut(o))
            .map(|country| {
                country.region_ids.push(id.to_string());
                country.market_id.clone()
            });
        self.state.regions.insert(
            id.to_string(),
            Region {
                id: id.to_string(),
                name: id.to_string(),
                owner: owner.map(str::to_string),
                market_id,
                outputs: outputs.iter().map(|(g, a)| ((*g).to_string(), *a)).collect(),
                building_ids: Vec::new(),
            },
        );
        self
    }

    /// Adds a pop whose purchase priority follows the order of `needs`.
    pub fn with_pop(
        mut self,
        id: &str,
        country: &str,
        size: f64,
        income_per_capita: f64,
        cash: f64,
        needs: &[(&str, f64)],
    ) -> Self {
        if let Some(c) = self.state.countries.get_mut(country) {
            c.pop_ids.push(id.to_string());
        }
        self.state.pops.insert(
            id.to_string(),
            Pop {
                id: id.to_string(),
                country_id: country.to_string(),
                size,
                income_per_capita,
                cash,
                needs: needs.iter().map(|(g, n)| ((*g).to_string(), *n)).collect(),
                priority: needs.iter().map(|(g, _)| (*g).to_string()).collect(),
                satisfaction: BTreeMap::new(),
                satisfaction_avg: 1.0,
            },
        );
        self
    }

    pub fn with_building_type(mut self, building_type: BuildingType) -> Self {
        self.state
            .building_types
            .insert(building_type.id.clone(), building_type);
        self
    }

    pub fn with_building(mut self, id: &str, type_id: &str, region: &str, level: u32) -> Self {
        if let Some(r) = self.state.regions.get_mut(region) {
            r.building_ids.push(id.to_string());
        }
        self.state.buildings.insert(
            id.to_string(),
            Building {
                id: id.to_string(),
                type_id: type_id.to_string(),
                region_id: region.to_string(),
                level,
                capacity_multiplier: 1.0,
                enabled: true,
            },
        );
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_route(
        mut self,
        id: &str,
        src_market: &str,
        dst_market: &str,
        good: &str,
        capacity: f64,
        tariff: f64,
        transport_cost: f64,
    ) -> Self {
        self.state.routes.insert(
            id.to_string(),
            TradeRoute {
                id: id.to_string(),
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
        self
    }

    pub fn with_stock(mut self, market: &str, good: &str, stock: f64) -> Self {
        self.stocks
            .push((market.to_string(), good.to_string(), stock));
        self
    }

    pub fn with_price(mut self, market: &str, good: &str, price: f64) -> Self {
        self.prices
            .push((market.to_string(), good.to_string(), price));
        self
    }

    pub fn with_ai(mut self, countries: &[&str], interval: u32) -> Self {
        self.state.ai_enabled = true;
        self.state.ai_interval = interval;
        self.state.ai_countries = countries.iter().map(|c| (*c).to_string()).collect();
        self
    }

    pub fn with_annex_cost(mut self, annex_cost: f64) -> Self {
        self.state.annex_cost = annex_cost;
        self
    }

    pub fn build(mut self) -> WorldState {
        for market in self.state.markets.values_mut() {
            for (good_id, def) in &self.state.goods {
                market
                    .goods
                    .entry(good_id.clone())
                    .or_insert_with(|| MarketGood::from_def(def, 1.0));
            }
        }
        for (market, good, stock) in self.stocks {
            if let Some(g) = self
                .state
                .markets
                .get_mut(&market)
                .and_then(|m| m.goods.get_mut(&good))
            {
                g.stock = stock;
            }
        }
        for (market, good, price) in self.prices {
            if let Some(g) = self
                .state
                .markets
                .get_mut(&market)
                .and_then(|m| m.goods.get_mut(&good))
            {
                g.price = price;
            }
        }
        self.state
    }
}

impl Default for WorldStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
