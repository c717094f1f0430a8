//! Replay harness
//!
//! Reads JSON-lines `OrderRequest`s from stdin, runs each through the
//! engine in order and prints one JSON `OrderResponse` per line. Takes an
//! optional TOML config path; defaults apply otherwise.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};
use trading_engine::{EngineConfig, TradingEngine};
use types::request::OrderRequest;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries responses; logs go to stderr
    fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path).with_context(|| format!("loading config from {path}"))?,
        None => EngineConfig::default(),
    };
    let engine = TradingEngine::start(config).context("starting trading engine")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut line_no = 0u64;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let request: OrderRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "Skipping malformed request");
                continue;
            }
        };
        let response = engine.submit_order(request).await;
        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
    }
    stdout.flush().await?;

    let metrics = engine.metrics();
    tracing::info!(metrics = %serde_json::to_string(&metrics)?, "Replay finished");
    engine.shutdown().await;
    Ok(())
}
