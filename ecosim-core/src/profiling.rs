//! Optional Tracy profiling of the tick pipeline.
//!
//! Every system runs inside a `tracing` span. Build with `--features tracy`
//! and call [`init_tracy`] early in main to stream those spans to Tracy;
//! without the feature both functions here compile to nothing.

/// Minimum span level captured by Tracy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraceLevel {
    #[default]
    Info,
    Debug,
    Trace,
}

impl std::str::FromStr for TraceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(TraceLevel::Info),
            "debug" => Ok(TraceLevel::Debug),
            "trace" => Ok(TraceLevel::Trace),
            _ => Err(format!("Invalid trace level: {s}. Use info, debug, or trace.")),
        }
    }
}

/// Installs the Tracy subscriber.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
#[cfg(feature = "tracy")]
pub fn init_tracy(level: TraceLevel) {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;

    let filter = match level {
        TraceLevel::Info => LevelFilter::INFO,
        TraceLevel::Debug => LevelFilter::DEBUG,
        TraceLevel::Trace => LevelFilter::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_tracy::TracyLayer::default())
        .with(filter)
        .init();
}

#[cfg(not(feature = "tracy"))]
pub fn init_tracy(_level: TraceLevel) {}

/// Marks a tick boundary in Tracy's timeline.
#[cfg(feature = "tracy")]
#[inline]
pub fn frame_mark_tick() {
    tracy_client::secondary_frame_mark!("tick");
}

#[cfg(not(feature = "tracy"))]
#[inline]
pub fn frame_mark_tick() {}
