//! Text command parsing for scripted runs.
//!
//! ```text
//! tick [n]
//! status
//! markets | market <id>
//! country <id>
//! goods
//! regions | region <id>
//! buildings
//! help
//! build <region> <type> [level]
//! toggle_building <id>
//! route add <src> <dst> <good> <capacity> <transport_cost> <tariff>
//! annex <region>
//! set tax <country> <rate>
//! ai on|off
//! ```
//!
//! `build` and `annex` act for the selected country; `country` and `market`
//! change the selection. Blank lines and lines starting with `#` are ignored.

use ecosim_core::state::{CountryId, MarketId, RegionId};
use ecosim_core::Command;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("{command}: missing <{argument}>")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("{argument}: '{value}' is not a number")]
    InvalidNumber {
        argument: &'static str,
        value: String,
    },
    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
    #[error("ai: expected 'on' or 'off', got '{0}'")]
    InvalidToggle(String),
    #[error("tick count must be positive")]
    NoTicks,
}

/// Read-only views and selection changes.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Status line of the selected country.
    Status,
    Markets,
    /// Market table; selects the market's country.
    Market(MarketId),
    /// Status line; selects the country.
    Country(CountryId),
    Goods,
    Regions,
    Region(RegionId),
    Buildings,
    Help,
}

pub const HELP: &str = "\
Commands:
- tick [n]
- status
- markets | market <id>
- country <country_id>
- goods
- regions | region <id>
- buildings
- build <region_id> <building_type> [level]
- toggle_building <building_id>
- route add <src_market> <dst_market> <good> <cap> <transport_cost> <tariff_rate>
- annex <region_id>
- set tax <country_id> <rate>
- ai on|off
- help
";

/// One parsed script line.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptLine {
    /// Advance the world this many ticks.
    Tick(u64),
    Command(Command),
    Query(Query),
}

/// Parses one line; `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str, country: &str) -> Result<Option<ScriptLine>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut args = Args::new(line);
    let Some(head) = args.next() else {
        return Ok(None);
    };

    let parsed = match head {
        "tick" => {
            let ticks = match args.next() {
                Some(value) => parse_number(value, "n")?,
                None => 1,
            };
            if ticks == 0 {
                return Err(ParseError::NoTicks);
            }
            ScriptLine::Tick(ticks)
        }
        "status" => ScriptLine::Query(Query::Status),
        "markets" => ScriptLine::Query(Query::Markets),
        "market" => {
            let id = args.required("market", "id")?;
            ScriptLine::Query(Query::Market(id.to_string()))
        }
        "country" => {
            let id = args.required("country", "id")?;
            ScriptLine::Query(Query::Country(id.to_string()))
        }
        "goods" => ScriptLine::Query(Query::Goods),
        "regions" => ScriptLine::Query(Query::Regions),
        "region" => {
            let id = args.required("region", "id")?;
            ScriptLine::Query(Query::Region(id.to_string()))
        }
        "buildings" => ScriptLine::Query(Query::Buildings),
        "help" => ScriptLine::Query(Query::Help),
        "build" => {
            let region = args.required("build", "region")?;
            let building_type = args.required("build", "type")?;
            let level = match args.next() {
                Some(value) => parse_number(value, "level")?,
                None => 1,
            };
            ScriptLine::Command(Command::Build {
                country: country.to_string(),
                region: region.to_string(),
                building_type: building_type.to_string(),
                level,
            })
        }
        "toggle_building" => ScriptLine::Command(Command::ToggleBuilding {
            building: args.required("toggle_building", "id")?.to_string(),
        }),
        "route" => {
            match args.next() {
                Some("add") => {}
                Some(other) => return Err(ParseError::UnknownCommand(format!("route {other}"))),
                None => {
                    return Err(ParseError::MissingArgument {
                        command: "route",
                        argument: "add",
                    })
                }
            }
            let src_market = args.required("route add", "src")?.to_string();
            let dst_market = args.required("route add", "dst")?.to_string();
            let good = args.required("route add", "good")?.to_string();
            let capacity = parse_number(args.required("route add", "capacity")?, "capacity")?;
            let transport_cost = parse_number(
                args.required("route add", "transport_cost")?,
                "transport_cost",
            )?;
            let tariff = parse_number(args.required("route add", "tariff")?, "tariff")?;
            ScriptLine::Command(Command::AddRoute {
                src_market,
                dst_market,
                good,
                capacity,
                tariff,
                transport_cost,
            })
        }
        "annex" => ScriptLine::Command(Command::Annex {
            country: country.to_string(),
            region: args.required("annex", "region")?.to_string(),
        }),
        "set" => {
            match args.next() {
                Some("tax") => {}
                Some(other) => return Err(ParseError::UnknownCommand(format!("set {other}"))),
                None => {
                    return Err(ParseError::MissingArgument {
                        command: "set",
                        argument: "tax",
                    })
                }
            }
            let target = args.required("set tax", "country")?.to_string();
            let rate = parse_number(args.required("set tax", "rate")?, "rate")?;
            ScriptLine::Command(Command::SetTaxRate {
                country: target,
                rate,
            })
        }
        "ai" => {
            let enabled = match args.required("ai", "on|off")? {
                "on" => true,
                "off" => false,
                other => return Err(ParseError::InvalidToggle(other.to_string())),
            };
            ScriptLine::Command(Command::SetAi { enabled })
        }
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };

    if let Some(extra) = args.next() {
        return Err(ParseError::UnexpectedArgument(extra.to_string()));
    }
    Ok(Some(parsed))
}

struct Args<'a> {
    words: std::str::SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            words: line.split_whitespace(),
        }
    }

    fn next(&mut self) -> Option<&'a str> {
        self.words.next()
    }

    fn required(
        &mut self,
        command: &'static str,
        argument: &'static str,
    ) -> Result<&'a str, ParseError> {
        self.next()
            .ok_or(ParseError::MissingArgument { command, argument })
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, argument: &'static str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        argument,
        value: value.to_string(),
    })
}
