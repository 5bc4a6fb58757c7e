//! Probe service with a configurable startup delay.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ access log ─▶ recovery ─▶ request ID ─▶ body limit ─┐
//!                                                                          │
//!                      ┌───────────────────────────────────────────────────┘
//!                      ▼
//!               ┌─────────────┐   read    ┌──────────────────────┐
//!               │   probes    │──────────▶│  health / ready gate │
//!               │ /healthz    │           │  (delayed, resettable)│
//!               │ /readyz     │           └──────────▲───────────┘
//!               └─────────────┘                      │ reset
//!               ┌─────────────┐                      │
//!               │    admin    │──────────────────────┘
//!               │ /admin/...  │
//!               └─────────────┘
//! ```
//!
//! Exit codes: 0 after a clean shutdown, 1 on a runtime or drain failure,
//! 2 on a configuration error.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use probe_delay::config;
use probe_delay::lifecycle::startup;
use probe_delay::observability::logging;

#[derive(Parser)]
#[command(name = "probe-delay", version)]
#[command(about = "Health and readiness probes that turn green after a delay", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "PROBE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match startup::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
