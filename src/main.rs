//! # News Insight Engine
//!
//! Analytics orchestration engine answering structured questions over a
//! corpus of news articles.
//!
//! This binary is the headless runner: it loads configuration from the
//! environment, wires the engine, then reads one JSON command request per
//! stdin line and writes one JSON response envelope per stdout line. Chat
//! and HTTP front-ends host the library crates directly.
//!
//! ## Usage
//!
//! ```bash
//! # Mock mode, no provider keys needed
//! PHASE3_MODEL_ROUTER_MODE=mock news-insight-engine
//!
//! # Then, per line:
//! {"command": "ask", "query": "How is AI adoption progressing?", "depth": 2}
//! ```

use anyhow::Context;
use insight_config::EngineConfig;
use insight_orchestrator::{CommandRequest, EngineBuilder};
use insight_telemetry::{init_tracing, TracingConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

/// Application entry point.
#[tokio::main]
async fn main() {
    let config = EngineConfig::from_env();

    if let Err(e) = init_tracing(
        &TracingConfig::new("news-insight-engine").with_log_level(config.log_level.clone()),
    ) {
        eprintln!("Failed to initialize tracing: {e}");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        metrics_port = config.metrics_port,
        "starting news insight engine"
    );

    if let Err(e) = run(config).await {
        error!(error = %e, "engine failed");
        std::process::exit(1);
    }
}

async fn run(config: EngineConfig) -> anyhow::Result<()> {
    let engine = EngineBuilder::new(config)
        .build()
        .context("failed to wire engine")?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let output = match serde_json::from_str::<CommandRequest>(&line) {
            Ok(request) => {
                let response = engine.execute(request).await;
                serde_json::to_string(&response)?
            }
            Err(e) => serde_json::to_string(&serde_json::json!({
                "error": "INTERNAL",
                "user_message": "Request could not be parsed",
                "tech_message": e.to_string(),
                "retryable": false,
            }))?,
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}
