use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

pub type GoodId = String;
pub type MarketId = String;
pub type RegionId = String;
pub type CountryId = String;
pub type PopId = String;
pub type BuildingId = String;
pub type BuildingTypeId = String;
pub type RouteId = String;

/// Price-formation policy for a good. Immutable content, never touched by systems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodDef {
    pub id: GoodId,
    pub name: String,
    /// Reference price (> 0).
    pub base_price: f64,
    /// Sensitivity of the price controller.
    pub price_k: f64,
    pub min_price_factor: f64,
    pub max_price_factor: f64,
}

/// Per-market state for a single good.
///
/// The accumulators (`produced` .. `last_delta`) are reset at the start of
/// every tick and only ever added to by systems during that tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketGood {
    pub price: f64,
    pub stock: f64,
    pub base_price: f64,
    pub price_k: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub produced: f64,
    pub demanded: f64,
    pub bought: f64,
    pub unmet: f64,
    pub traded_in: f64,
    pub traded_out: f64,
    pub last_delta: f64,
}

impl MarketGood {
    /// Market state for `def` with the starting price scaled by `bias`.
    pub fn from_def(def: &GoodDef, bias: f64) -> Self {
        Self {
            price: def.base_price * bias,
            stock: 0.0,
            base_price: def.base_price,
            price_k: def.price_k,
            min_price: def.base_price * def.min_price_factor,
            max_price: def.base_price * def.max_price_factor,
            produced: 0.0,
            demanded: 0.0,
            bought: 0.0,
            unmet: 0.0,
            traded_in: 0.0,
            traded_out: 0.0,
            last_delta: 0.0,
        }
    }

    pub fn reset_tick_stats(&mut self) {
        self.produced = 0.0;
        self.demanded = 0.0;
        self.bought = 0.0;
        self.unmet = 0.0;
        self.traded_in = 0.0;
        self.traded_out = 0.0;
        self.last_delta = 0.0;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub name: String,
    /// Country served by this market (1:1).
    pub country_id: CountryId,
    pub goods: BTreeMap<GoodId, MarketGood>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    /// None for neutral regions.
    pub owner: Option<CountryId>,
    /// None only while the region is unowned.
    pub market_id: Option<MarketId>,
    /// Raw output per tick, before the price response.
    pub outputs: BTreeMap<GoodId, f64>,
    pub building_ids: Vec<BuildingId>,
}

/// Static recipe definition shared by every instance of the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingType {
    pub id: BuildingTypeId,
    pub name: String,
    /// Goods consumed per run.
    pub inputs: BTreeMap<GoodId, f64>,
    /// Goods produced per run.
    pub outputs: BTreeMap<GoodId, f64>,
    /// Runs per tick at level 1.
    pub base_capacity: f64,
    /// Treasury cost to construct.
    pub cost: f64,
    /// Recurring cost per level per tick.
    pub upkeep: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub type_id: BuildingTypeId,
    pub region_id: RegionId,
    /// Always >= 1.
    pub level: u32,
    pub capacity_multiplier: f64,
    pub enabled: bool,
}

impl Building {
    pub fn effective_capacity(&self, building_type: &BuildingType) -> f64 {
        building_type.base_capacity * f64::from(self.level) * self.capacity_multiplier
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pop {
    pub id: PopId,
    pub country_id: CountryId,
    pub size: f64,
    pub income_per_capita: f64,
    pub cash: f64,
    /// Per-capita need by good.
    pub needs: BTreeMap<GoodId, f64>,
    /// Purchase order; earlier goods get first claim on cash and stock.
    pub priority: Vec<GoodId>,
    /// Last bought / need ratio per good, in [0, 1].
    pub satisfaction: BTreeMap<GoodId, f64>,
    pub satisfaction_avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub market_id: MarketId,
    pub treasury: f64,
    pub tax_rate: f64,
    pub region_ids: Vec<RegionId>,
    pub pop_ids: Vec<PopId>,
}

/// Directed, capacity-limited channel moving one good between two markets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRoute {
    pub id: RouteId,
    pub src_market_id: MarketId,
    pub dst_market_id: MarketId,
    pub good_id: GoodId,
    /// Max units moved per tick.
    pub capacity: f64,
    /// Rate applied to the destination price, paid to the importer.
    pub tariff: f64,
    pub transport_cost: f64,
    pub last_moved: f64,
    pub last_profit: f64,
    pub last_tariff: f64,
}

impl TradeRoute {
    pub fn clear_flow(&mut self) {
        self.last_moved = 0.0;
        self.last_profit = 0.0;
        self.last_tariff = 0.0;
    }

    /// True if either end of the route is `market_id`.
    pub fn touches(&self, market_id: &str) -> bool {
        self.src_market_id == market_id || self.dst_market_id == market_id
    }
}

/// Category tag for an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Tick,
    Trade,
    Finance,
    Build,
    Annex,
    Policy,
    Ai,
    AiBuild,
    AiTrade,
    AiAnnex,
    AiTax,
    AiTariff,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::Trade => "trade",
            Self::Finance => "finance",
            Self::Build => "build",
            Self::Annex => "annex",
            Self::Policy => "policy",
            Self::Ai => "ai",
            Self::AiBuild => "ai_build",
            Self::AiTrade => "ai_trade",
            Self::AiAnnex => "ai_annex",
            Self::AiTax => "ai_tax",
            Self::AiTariff => "ai_tariff",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Human-readable annotation of something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub message: String,
    pub tick: u64,
    pub payload: BTreeMap<String, String>,
}

/// Append-only event ring buffer keeping the most recent `capacity` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    entries: VecDeque<Event>,
    capacity: usize,
    /// Count of every event ever pushed, including evicted ones.
    total: u64,
}

impl EventLog {
    pub const DEFAULT_CAPACITY: usize = 200;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
            capacity: capacity.max(1),
            total: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        self.entries.push_back(event);
        self.total += 1;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the cap, evicting the oldest entries if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&Event> {
        self.entries.back()
    }

    /// The newest `n` events, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Event> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }

    /// Total number of events ever logged. Use as a cursor for [`Self::since`].
    pub fn total_logged(&self) -> u64 {
        self.total
    }

    /// Events logged after `cursor` that are still retained.
    pub fn since(&self, cursor: u64) -> impl Iterator<Item = &Event> {
        let fresh = usize::try_from(self.total.saturating_sub(cursor)).unwrap_or(usize::MAX);
        self.recent(fresh)
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

/// An arithmetic defect detected after a tick. Never expected at runtime.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("stock of {good} in {market} is {stock}")]
    NegativeStock {
        market: MarketId,
        good: GoodId,
        stock: f64,
    },
    #[error("price of {good} in {market} is {price}, outside [{min}, {max}]")]
    PriceOutOfBounds {
        market: MarketId,
        good: GoodId,
        price: f64,
        min: f64,
        max: f64,
    },
    #[error("cash of pop {pop} is {cash}")]
    NegativeCash { pop: PopId, cash: f64 },
    #[error("treasury of {country} is {treasury}")]
    NegativeTreasury { country: CountryId, treasury: f64 },
    #[error("route {route} moved {moved} over capacity {capacity}")]
    RouteOverCapacity {
        route: RouteId,
        moved: f64,
        capacity: f64,
    },
}

/// The whole simulated world. Every system takes `&mut WorldState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    pub tick: u64,
    pub goods: BTreeMap<GoodId, GoodDef>,
    pub building_types: BTreeMap<BuildingTypeId, BuildingType>,
    pub markets: BTreeMap<MarketId, Market>,
    pub regions: BTreeMap<RegionId, Region>,
    pub buildings: BTreeMap<BuildingId, Building>,
    pub countries: BTreeMap<CountryId, Country>,
    pub pops: BTreeMap<PopId, Pop>,
    pub routes: BTreeMap<RouteId, TradeRoute>,
    pub events: EventLog,
    /// Last id issued per prefix.
    pub id_counters: BTreeMap<String, u64>,
    pub annex_cost: f64,
    pub ai_enabled: bool,
    /// AI countries, evaluated in this order.
    pub ai_countries: Vec<CountryId>,
    /// AI runs on ticks where `tick % ai_interval == 0`; 0 disables it.
    pub ai_interval: u32,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            tick: 0,
            goods: BTreeMap::new(),
            building_types: BTreeMap::new(),
            markets: BTreeMap::new(),
            regions: BTreeMap::new(),
            buildings: BTreeMap::new(),
            countries: BTreeMap::new(),
            pops: BTreeMap::new(),
            routes: BTreeMap::new(),
            events: EventLog::default(),
            id_counters: BTreeMap::new(),
            annex_cost: 50.0,
            ai_enabled: false,
            ai_countries: Vec::new(),
            ai_interval: 1,
        }
    }
}

impl WorldState {
    /// Issues the next id for `prefix`, e.g. `bld004`.
    pub fn next_id(&mut self, prefix: &str) -> String {
        let counter = self.id_counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{prefix}{:03}", *counter)
    }

    /// Appends an event stamped with the current tick.
    pub fn add_event(&mut self, kind: EventKind, message: impl Into<String>, payload: &[(&str, &str)]) {
        let payload = payload
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self.events.push(Event {
            kind,
            message: message.into(),
            tick: self.tick,
            payload,
        });
    }

    pub fn good(&self, id: &str) -> Option<&GoodDef> {
        self.goods.get(id)
    }

    pub fn building_type(&self, id: &str) -> Option<&BuildingType> {
        self.building_types.get(id)
    }

    pub fn market(&self, id: &str) -> Option<&Market> {
        self.markets.get(id)
    }

    pub fn market_good(&self, market_id: &str, good_id: &str) -> Option<&MarketGood> {
        self.markets.get(market_id)?.goods.get(good_id)
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.get(id)
    }

    pub fn building(&self, id: &str) -> Option<&Building> {
        self.buildings.get(id)
    }

    pub fn country(&self, id: &str) -> Option<&Country> {
        self.countries.get(id)
    }

    pub fn pop(&self, id: &str) -> Option<&Pop> {
        self.pops.get(id)
    }

    pub fn route(&self, id: &str) -> Option<&TradeRoute> {
        self.routes.get(id)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Sum of `stock` for `good_id` across every market.
    pub fn total_stock(&self, good_id: &str) -> f64 {
        self.markets
            .values()
            .filter_map(|m| m.goods.get(good_id))
            .map(|g| g.stock)
            .sum()
    }

    /// Compute a deterministic checksum of the world state.
    ///
    /// Floats are hashed by bit pattern, so two worlds share a checksum only
    /// if every price, stock and balance is bit-identical.
    pub fn checksum(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);

        for (id, market) in &self.markets {
            id.hash(&mut hasher);
            for (good_id, g) in &market.goods {
                good_id.hash(&mut hasher);
                g.price.to_bits().hash(&mut hasher);
                g.stock.to_bits().hash(&mut hasher);
            }
        }
        for (id, country) in &self.countries {
            id.hash(&mut hasher);
            country.treasury.to_bits().hash(&mut hasher);
            country.tax_rate.to_bits().hash(&mut hasher);
            country.region_ids.hash(&mut hasher);
        }
        for (id, pop) in &self.pops {
            id.hash(&mut hasher);
            pop.cash.to_bits().hash(&mut hasher);
            pop.satisfaction_avg.to_bits().hash(&mut hasher);
        }
        for (id, region) in &self.regions {
            id.hash(&mut hasher);
            region.owner.hash(&mut hasher);
            region.building_ids.hash(&mut hasher);
        }
        for (id, building) in &self.buildings {
            id.hash(&mut hasher);
            building.type_id.hash(&mut hasher);
            building.level.hash(&mut hasher);
            building.enabled.hash(&mut hasher);
        }
        for (id, route) in &self.routes {
            id.hash(&mut hasher);
            route.src_market_id.hash(&mut hasher);
            route.dst_market_id.hash(&mut hasher);
            route.good_id.hash(&mut hasher);
            route.tariff.to_bits().hash(&mut hasher);
            route.last_moved.to_bits().hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Verifies the numeric invariants every tick must preserve.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for (market_id, market) in &self.markets {
            for (good_id, g) in &market.goods {
                // Written as negated comparisons so NaN also fails.
                if !(g.stock >= 0.0) {
                    return Err(InvariantViolation::NegativeStock {
                        market: market_id.clone(),
                        good: good_id.clone(),
                        stock: g.stock,
                    });
                }
                if !(g.price >= g.min_price && g.price <= g.max_price) {
                    return Err(InvariantViolation::PriceOutOfBounds {
                        market: market_id.clone(),
                        good: good_id.clone(),
                        price: g.price,
                        min: g.min_price,
                        max: g.max_price,
                    });
                }
            }
        }
        for (pop_id, pop) in &self.pops {
            if !(pop.cash >= 0.0) {
                return Err(InvariantViolation::NegativeCash {
                    pop: pop_id.clone(),
                    cash: pop.cash,
                });
            }
        }
        for (country_id, country) in &self.countries {
            if !(country.treasury >= 0.0) {
                return Err(InvariantViolation::NegativeTreasury {
                    country: country_id.clone(),
                    treasury: country.treasury,
                });
            }
        }
        for (route_id, route) in &self.routes {
            if route.last_moved > route.capacity + 1e-9 {
                return Err(InvariantViolation::RouteOverCapacity {
                    route: route_id.clone(),
                    moved: route.last_moved,
                    capacity: route.capacity,
                });
            }
        }
        Ok(())
    }
}
