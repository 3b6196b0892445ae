//! Onboarding flow demo
//!
//! Runs the same enum-based trace against a well-behaved and a misbehaving
//! flow and prints both reports.
//!
//! Usage:
//!   cargo run --example onboarding_flow
//!   RUST_LOG=debug cargo run --example onboarding_flow

use event_trace::{Trace, TraceConfig, TraceItem, TraceReport, TraceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Event {
    LogicCheckpointOne,
    LogicCheckpointTwo,
    LogicCheckpointThree,
}

impl Event {
    fn ux_flow_hint(&self) -> &'static str {
        match self {
            Event::LogicCheckpointOne => "Step one here",
            Event::LogicCheckpointTwo => "Step two here",
            Event::LogicCheckpointThree => "Step three here",
        }
    }

    fn to_trace_item(self) -> TraceItem {
        TraceItem::new("event", self).with_hint(self.ux_flow_hint())
    }
}

fn onboarding_trace() -> Trace {
    Trace::new(
        "Onboarding",
        vec![
            Event::LogicCheckpointOne.to_trace_item(),
            Event::LogicCheckpointTwo.to_trace_item(),
            Event::LogicCheckpointThree.to_trace_item(),
        ],
    )
    .with_description("Checkpoints fire in order, exactly once")
    .with_config(TraceConfig::new().with_enforce_order(true))
}

fn run(label: &str, fired: &[Event]) -> event_trace::Result<()> {
    let mut result = TraceResult::new(onboarding_trace());
    result.subscribe(|state| log::info!("Overall state changed to {}", state));

    for event in fired {
        result.fire(event.to_trace_item());
    }
    result.finalize();

    let report = TraceReport::new(&result);
    println!("\n### {} ###", label);
    println!("{}", report.summary());
    println!("{}", report.csv_log()?);
    Ok(())
}

fn main() -> event_trace::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    run(
        "Happy path",
        &[
            Event::LogicCheckpointOne,
            Event::LogicCheckpointTwo,
            Event::LogicCheckpointThree,
        ],
    )?;

    run(
        "Checkpoint two fires first, then twice",
        &[
            Event::LogicCheckpointTwo,
            Event::LogicCheckpointOne,
            Event::LogicCheckpointTwo,
        ],
    )
}
