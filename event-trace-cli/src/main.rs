//! Event Trace CLI Application
//!
//! This is the command-line session controller for the event-trace library.
//! It uses the event-trace library and adds:
//! - Trace definitions loaded from TOML
//! - Replay of recorded fired items (JSON lines) through a session
//! - Session deadlines and event limits
//! - Report output (summary, raw log, CSV)

use anyhow::{bail, Result};
use clap::Parser;
use event_trace::TraceState;
use std::path::PathBuf;

mod config;
mod events;
mod report;
mod session;

/// Event Trace - Verify fired events against an expected sequence
#[derive(Parser, Debug)]
#[command(name = "event-trace-cli")]
#[command(about = "Verify recorded events against an expected sequence", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the trace definition (trace.toml)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Path to the recorded events (JSON lines, `-` for stdin)
    #[arg(short, long, value_name = "FILE")]
    events: PathBuf,

    /// Directory for report files (default: stdout)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Maximum number of events to deliver
    #[arg(long, value_name = "COUNT")]
    max_events: Option<usize>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Event Trace CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using event-trace library v{}", event_trace::VERSION);

    log::info!("Loading configuration from: {:?}", args.config);
    let mut config = config::load_config(&args.config)?;
    if args.max_events.is_some() {
        config.session.max_events = args.max_events;
    }
    let trace = config.trace.to_trace()?;
    log::debug!("Configuration loaded successfully");

    let events = events::load_events(&args.events)?;

    let mut session = session::Session::start(trace)?;
    let summary = session.replay(&events, &config.session);
    session.stop();
    let transitions: Vec<String> = session.transitions().iter().map(|s| s.to_string()).collect();
    let result = session.result();

    if !args.quiet {
        println!("═══════════════════════════════════════════════");
        println!("  Trace: {}", result.trace().name);
        println!("═══════════════════════════════════════════════");
        println!("  Events delivered: {}", summary.delivered);
        println!("  Events skipped:   {} ({:?})", summary.skipped, summary.stop_reason);
        println!("  State changes:    {}", transitions.join(" -> "));
        println!("  Result:           {}", result.state());
        println!("───────────────────────────────────────────────\n");
    }

    let written = report::write_reports(result, &config.output, args.output_dir.as_deref())?;
    for path in &written {
        if !args.quiet {
            println!("✓ Report written: {:?}", path);
        }
    }

    if result.state() != TraceState::Passed {
        bail!("Trace '{}' did not pass: {}", result.trace().name, result.state());
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
