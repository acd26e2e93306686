use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use ecosim::report::full_report;
use ecosim::{LineOutcome, Session};
use ecosim_core::profiling::{init_tracy, TraceLevel};
use ecosim_core::{default_scenario, ConsoleObserver, EventLogObserver, SimConfig};
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of ticks to run after the scripted commands
    #[arg(short, long, default_value_t = 10)]
    ticks: u64,

    /// JSON config file (fields not given keep their defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override whether AI countries act
    #[arg(long, value_enum)]
    ai: Option<Switch>,

    /// Country that build and annex commands act for
    #[arg(long, default_value = "country_north")]
    country: String,

    /// Script line applied before ticking, e.g. "annex frontier_forest" or "regions" (repeatable)
    #[arg(long = "command", value_name = "TEXT")]
    commands: Vec<String>,

    /// Stream logged events as JSON lines to PATH, or stdout with "-"
    #[arg(long, value_name = "PATH")]
    events: Option<String>,

    /// Print country status lines every N ticks (0 = only the final report)
    #[arg(long, default_value_t = 0)]
    report_every: u32,

    /// Number of recent events in the final report
    #[arg(long, default_value_t = 10)]
    recent: usize,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Tracy span level (only used with the tracy feature)
    #[arg(long, default_value = "info")]
    trace_level: TraceLevel,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
    init_tracy(args.trace_level);

    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(ai) = args.ai {
        config.ai_enabled = matches!(ai, Switch::On);
    }

    let mut state = default_scenario();
    config.apply(&mut state);
    if state.country(&args.country).is_none() {
        bail!("Unknown country: {}", args.country);
    }
    log::info!(
        "Starting ecosim: {} countries, AI {}",
        state.countries.len(),
        if state.ai_enabled { "on" } else { "off" }
    );

    let mut session = Session::new(state, args.country.clone());
    session.checksum_frequency = config.checksum_frequency;

    match args.events.as_deref() {
        Some("-") => session.registry.register(Box::new(EventLogObserver::stdout())),
        Some(path) => session.registry.register(Box::new(
            EventLogObserver::file(path).with_context(|| format!("creating {path}"))?,
        )),
        None => {}
    }
    if args.report_every > 0 {
        let ids: Vec<&str> = session.state.countries.keys().map(String::as_str).collect();
        let console = ConsoleObserver::new(&ids)
            .with_frequency(args.report_every)
            .with_colors(std::io::stdout().is_terminal());
        session.registry.register(Box::new(console));
    }

    for line in &args.commands {
        match session.apply_line(line) {
            Ok(LineOutcome::Applied(outcome)) => println!("{outcome}"),
            Ok(LineOutcome::Report(text)) => print!("{text}"),
            Ok(LineOutcome::Ticked(n)) => log::info!("Advanced {} ticks", n),
            Ok(LineOutcome::Skipped) => {}
            Err(e) => {
                log::warn!("Command '{}' failed", line);
                eprintln!("error: {e}");
            }
        }
    }

    session.run_ticks(args.ticks);
    session.finish();

    print!("{}", full_report(&session.state, &session.selected, args.recent));

    let metrics = &session.metrics;
    log::info!(
        "Simulation finished at tick {} ({} ticks, {:.3} ms/tick)",
        session.state.tick,
        metrics.total_ticks,
        metrics.tick_avg_ms()
    );
    for (system, time) in metrics.system_breakdown() {
        log::debug!("  {:<12} {:?}", system, time);
    }

    Ok(())
}
