//! Event log observer streaming newly logged events as JSONL.
//!
//! Each notification writes every [`Event`](crate::state::Event) appended to
//! the world's event log since the previous notification, one JSON object per
//! line:
//!
//! ```json
//! {"kind":"trade","message":"Route route_grain moved 8.00 grain","tick":3,"payload":{"good_id":"grain","route_id":"route_grain"}}
//! ```
//!
//! Events evicted from the ring buffer before the observer saw them are
//! reported once as a warning and skipped.

use super::{ObserverConfig, ObserverError, SimObserver, Snapshot};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Writes world events to any `Write` destination (stdout, file, pipe).
///
/// # Example
///
/// ```ignore
/// let observer = EventLogObserver::file("events.jsonl")?;
/// registry.register(Box::new(observer));
/// ```
pub struct EventLogObserver {
    /// Destination for JSONL output
    writer: Mutex<Box<dyn Write + Send>>,
    /// `EventLog::total_logged` at the last notification
    cursor: Mutex<u64>,
    config: ObserverConfig,
}

impl EventLogObserver {
    /// Create observer writing to stdout.
    ///
    /// Useful for piping to tools like `jq`.
    pub fn stdout() -> Self {
        Self::new(Box::new(BufWriter::new(std::io::stdout())))
    }

    /// Create observer writing to a file, truncating it.
    pub fn file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }

    /// Create observer with a custom writer.
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            cursor: Mutex::new(0),
            config: ObserverConfig::default(),
        }
    }

    /// Start after events already in the log, e.g. setup commands.
    pub fn starting_at(self, cursor: u64) -> Self {
        if let Ok(mut c) = self.cursor.lock() {
            *c = cursor;
        }
        self
    }
}

impl SimObserver for EventLogObserver {
    fn on_tick(&self, snapshot: &Snapshot) -> Result<(), ObserverError> {
        let mut cursor = self.cursor.lock().map_err(|_| ObserverError::Poisoned)?;
        let log = &snapshot.state.events;
        let total = log.total_logged();
        if total <= *cursor {
            return Ok(());
        }

        let fresh = total - *cursor;
        let retained = log.len() as u64;
        if fresh > retained {
            log::warn!(
                "Event log overflowed: {} events dropped before tick {}",
                fresh - retained,
                snapshot.tick
            );
        }

        let mut writer = self.writer.lock().map_err(|_| ObserverError::Poisoned)?;
        for event in log.since(*cursor) {
            serde_json::to_writer(&mut **writer, event)?;
            writeln!(writer)?;
        }
        writer.flush()?;

        *cursor = total;
        Ok(())
    }

    fn name(&self) -> &str {
        "EventLogObserver"
    }

    fn config(&self) -> ObserverConfig {
        self.config.clone()
    }

    fn on_finish(&self, snapshot: &Snapshot) -> Result<(), ObserverError> {
        self.on_tick(snapshot)
    }

    fn on_shutdown(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Event, EventKind, WorldState};
    use crate::testing::WorldStateBuilder;
    use std::io::Cursor;
    use std::sync::Arc;

    fn capture_output() -> Arc<Mutex<Cursor<Vec<u8>>>> {
        Arc::new(Mutex::new(Cursor::new(Vec::new())))
    }

    fn lines(output: &Arc<Mutex<Cursor<Vec<u8>>>>) -> Vec<String> {
        let guard = output.lock().unwrap();
        String::from_utf8(guard.get_ref().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn snapshot(state: &WorldState) -> Snapshot {
        Snapshot::new(state.clone(), state.tick, 0)
    }

    #[test]
    fn test_writes_only_new_events() {
        let output = capture_output();
        let observer = EventLogObserver::new(Box::new(OutputCapture(output.clone())));

        let mut state = WorldStateBuilder::new().tick(1).build();
        state.add_event(EventKind::Trade, "first", &[("route_id", "r1")]);
        observer.on_tick(&snapshot(&state)).unwrap();

        state.tick = 2;
        state.add_event(EventKind::Finance, "second", &[]);
        observer.on_tick(&snapshot(&state)).unwrap();
        observer.on_tick(&snapshot(&state)).unwrap();

        let lines = lines(&output);
        assert_eq!(lines.len(), 2);

        let first: Event = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first.kind, EventKind::Trade);
        assert_eq!(first.tick, 1);
        assert_eq!(first.payload["route_id"], "r1");
        assert!(lines[1].contains("\"kind\":\"finance\""));
        assert!(lines[1].contains("\"message\":\"second\""));
    }

    #[test]
    fn test_starting_at_skips_earlier_events() {
        let output = capture_output();
        let mut state = WorldStateBuilder::new().build();
        state.add_event(EventKind::Build, "setup", &[]);

        let observer = EventLogObserver::new(Box::new(OutputCapture(output.clone())))
            .starting_at(state.events.total_logged());
        state.add_event(EventKind::Policy, "after", &[]);
        observer.on_tick(&snapshot(&state)).unwrap();

        let lines = lines(&output);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("after"));
    }

    #[test]
    fn test_overflowed_events_are_skipped() {
        let output = capture_output();
        let observer = EventLogObserver::new(Box::new(OutputCapture(output.clone())));

        let mut state = WorldStateBuilder::new().build();
        state.events.set_capacity(2);
        for i in 0..5 {
            state.add_event(EventKind::Tick, format!("event {i}"), &[]);
        }
        observer.on_tick(&snapshot(&state)).unwrap();

        let lines = lines(&output);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("event 3"));
        assert!(lines[1].contains("event 4"));
    }

    #[test]
    fn test_finish_writes_events_logged_before_any_tick() {
        let output = capture_output();
        let observer = EventLogObserver::new(Box::new(OutputCapture(output.clone())));

        let mut state = WorldStateBuilder::new().build();
        state.add_event(EventKind::Annex, "Annexed wilds for north", &[]);
        observer.on_finish(&snapshot(&state)).unwrap();
        observer.on_finish(&snapshot(&state)).unwrap();

        let lines = lines(&output);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\"kind\":\"annex\""));
        assert!(lines[0].contains("\"tick\":0"));
    }

    /// Helper struct to capture output through Arc<Mutex<Cursor>>
    struct OutputCapture(Arc<Mutex<Cursor<Vec<u8>>>>);

    impl Write for OutputCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.0.lock().unwrap().flush()
        }
    }
}
