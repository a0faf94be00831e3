//! Example: streaming analysis of a local README through OpenAI.
//!
//! Reads settings from the environment (`OPENAI_API_KEY` is required).
//!
//! Run with: `cargo run --example openai_analysis -- path/to/README.md`

use std::sync::Arc;

use anyhow::Context;

use readme_digest::events::{Event, FnEventHandler};
use readme_digest::{AnalyzerSettings, InvocationMode};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("readme_digest=debug,warn"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().compact())
        .try_init()?;

    let path = std::env::args().nth(1).unwrap_or_else(|| "README.md".to_string());
    let readme = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;

    let mut settings = AnalyzerSettings::from_env().context("loading settings from the environment")?;
    settings.mode = InvocationMode::Streaming;

    let analyzer = settings
        .into_builder()
        .event_handler(Arc::new(FnEventHandler(|event: Event| {
            if let Event::Token { chunk } = event {
                eprint!("{}", chunk);
            }
        })))
        .build()?;

    let (result, report) = analyzer.analyze_with_report(&readme).await;

    println!("\n\n=== {} ===", path);
    println!("{}", result.summary());
    for fact in result.cool_facts() {
        println!("  - {}", fact);
    }
    println!("\n{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
