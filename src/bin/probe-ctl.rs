use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "probe-ctl")]
#[command(about = "Query and reset a running probe-delay service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "PROBE_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the liveness probe
    Health,
    /// Query the readiness probe
    Ready,
    /// Force gates back to pending (both unless one is selected)
    Reset {
        /// Reset only the health gate
        #[arg(long, conflicts_with = "ready")]
        health: bool,
        /// Reset only the ready gate
        #[arg(long)]
        ready: bool,
    },
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Health => "/healthz",
            Commands::Ready => "/readyz",
            Commands::Reset { health: true, .. } => "/admin/health/reset",
            Commands::Reset { ready: true, .. } => "/admin/ready/reset",
            Commands::Reset { .. } => "/admin/reset",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match execute(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the service answered with a 2xx status.
async fn execute(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());

    let res = match cli.command {
        Commands::Reset { .. } => client.post(&url).send().await?,
        _ => client.get(&url).send().await?,
    };
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);

    if !status.is_success() {
        eprintln!(
            "Service returned status {} (request id {})",
            status,
            request_id.as_deref().unwrap_or("-")
        );
    }
    Ok(status.is_success())
}
