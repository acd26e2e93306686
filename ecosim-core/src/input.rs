use crate::state::{BuildingId, BuildingTypeId, CountryId, GoodId, MarketId, RegionId};
use serde::{Deserialize, Serialize};

/// A mutation requested from outside the tick pipeline.
///
/// Executed with [`crate::step::execute_command`] between ticks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Command {
    // Economic
    Build {
        country: CountryId,
        region: RegionId,
        building_type: BuildingTypeId,
        level: u32,
    },
    ToggleBuilding {
        building: BuildingId,
    },
    AddRoute {
        src_market: MarketId,
        dst_market: MarketId,
        good: GoodId,
        capacity: f64,
        tariff: f64,
        transport_cost: f64,
    },

    // Territorial
    Annex {
        country: CountryId,
        region: RegionId,
    },

    // Policy
    SetTaxRate {
        country: CountryId,
        rate: f64,
    },

    // Meta
    SetAi {
        enabled: bool,
    },
}
