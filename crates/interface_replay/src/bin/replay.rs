//! Invoice Escrow - Scenario Replay Binary
//!
//! Replays a JSON scenario against an in-memory escrow ledger and prints
//! the report as JSON on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! escrow-replay crates/interface_replay/scenarios/invoice_lifecycle.json
//!
//! ESCROW_LOG_FORMAT=json ESCROW_LOG_LEVEL=debug escrow-replay scenario.json
//! ```
//!
//! # Environment Variables
//!
//! * `ESCROW_CURRENCY` - Ledger currency when the scenario names none (default: ETH)
//! * `ESCROW_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `ESCROW_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//!
//! The process exits with status 1 when any step does not meet its expectation.

use anyhow::Context;
use interface_replay::{run_scenario, LogFormat, ReplayConfig, Scenario};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = ReplayConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Invalid configuration ({}), using defaults", e);
        ReplayConfig::default()
    });
    init_tracing(&config.log_level, config.log_format);

    let path = std::env::args()
        .nth(1)
        .context("usage: escrow-replay <scenario.json>")?;
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read scenario {}", path))?;
    let scenario = Scenario::from_json(&json)
        .with_context(|| format!("failed to parse scenario {}", path))?;

    let report = run_scenario(&scenario, config.currency()?)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.passed() {
        for step in report.failures() {
            tracing::error!(
                index = step.index,
                action = %step.action,
                expected = ?step.expected_error,
                outcome = ?step.outcome,
                "Expectation not met"
            );
        }
        std::process::exit(1);
    }
    Ok(())
}

/// Initializes the tracing subscriber on stderr
///
/// # Arguments
///
/// * `log_level` - Fallback filter when `RUST_LOG` is unset
/// * `format` - Human-readable or JSON lines
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
