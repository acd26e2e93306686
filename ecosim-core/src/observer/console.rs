//! Console observer for terminal-based simulation monitoring.
//!
//! Prints one status line per country with the treasury change since the
//! previous notification.

use super::{ObserverConfig, ObserverError, SimObserver, Snapshot};
use crate::ai::heuristics::country_satisfaction;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Mutex;

/// Console observer that displays country statistics.
///
/// Treasury gains are shown in green and losses in red when colors are on.
pub struct ConsoleObserver {
    /// Country ids to observe
    countries: Vec<String>,
    writer: Mutex<Box<dyn Write + Send>>,
    /// Treasury at the previous notification
    last_treasury: Mutex<BTreeMap<String, f64>>,
    colored: bool,
    config: ObserverConfig,
}

impl ConsoleObserver {
    /// Observe the given countries, printing to stdout.
    pub fn new(countries: &[&str]) -> Self {
        Self::with_writer(countries, Box::new(io::stdout()))
    }

    pub fn with_writer(countries: &[&str], writer: Box<dyn Write + Send>) -> Self {
        Self {
            countries: countries.iter().map(|s| s.to_string()).collect(),
            writer: Mutex::new(writer),
            last_treasury: Mutex::new(BTreeMap::new()),
            colored: true,
            config: ObserverConfig::default(),
        }
    }

    /// Set the notification frequency.
    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.config.frequency = frequency;
        self
    }

    pub fn with_colors(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }
}

impl SimObserver for ConsoleObserver {
    fn on_tick(&self, snapshot: &Snapshot) -> Result<(), ObserverError> {
        let mut last = self.last_treasury.lock().map_err(|_| ObserverError::Poisoned)?;
        let mut writer = self.writer.lock().map_err(|_| ObserverError::Poisoned)?;
        let world = &snapshot.state;

        for id in &self.countries {
            let Some(country) = world.countries.get(id) else {
                writeln!(writer, "[{:>4}] {}: unknown country", snapshot.tick, id)?;
                continue;
            };

            let delta = last
                .insert(id.clone(), country.treasury)
                .map_or(0.0, |prev| country.treasury - prev);
            let (color, reset) = if self.colored {
                (delta_color(delta), "\x1b[0m")
            } else {
                ("", "")
            };

            writeln!(
                writer,
                "[{:>4}] {:<12} treasury {:>9.2} ({}{:>+7.2}{}) tax {:.2} sat {:.2} regions {}",
                snapshot.tick,
                country.name,
                country.treasury,
                color,
                delta,
                reset,
                country.tax_rate,
                country_satisfaction(world, id),
                country.region_ids.len(),
            )?;
        }

        writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "ConsoleObserver"
    }

    fn config(&self) -> ObserverConfig {
        self.config.clone()
    }
}

/// Returns ANSI color code based on delta sign.
fn delta_color(delta: f64) -> &'static str {
    if delta > 0.0 {
        "\x1b[32m" // Green for gains
    } else if delta < 0.0 {
        "\x1b[31m" // Red for losses
    } else {
        "\x1b[90m" // Gray for no change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::WorldStateBuilder;
    use std::sync::Arc;

    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_delta_color() {
        assert_eq!(delta_color(10.0), "\x1b[32m");
        assert_eq!(delta_color(-5.0), "\x1b[31m");
        assert_eq!(delta_color(0.0), "\x1b[90m");
    }

    #[test]
    fn test_console_observer_with_frequency() {
        let observer = ConsoleObserver::new(&["north"]).with_frequency(30);
        assert_eq!(observer.name(), "ConsoleObserver");
        assert_eq!(observer.config().frequency, 30);
    }

    #[test]
    fn test_status_lines_track_treasury_delta() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let observer =
            ConsoleObserver::with_writer(&["north", "ghost"], Box::new(SharedBuf(buf.clone())))
                .with_colors(false);

        let mut state = WorldStateBuilder::new()
            .tick(1)
            .with_country("north")
            .with_treasury("north", 100.0)
            .build();
        observer
            .on_tick(&Snapshot::new(state.clone(), 1, 0))
            .unwrap();

        state.tick = 2;
        state.countries.get_mut("north").unwrap().treasury = 92.5;
        observer.on_tick(&Snapshot::new(state, 2, 0)).unwrap();

        let text = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("treasury    100.00 (  +0.00)"));
        assert!(lines[1].contains("ghost: unknown country"));
        assert!(lines[2].contains("treasury     92.50 (  -7.50)"));
        assert!(lines[2].contains("tax 0.10"));
    }
}
