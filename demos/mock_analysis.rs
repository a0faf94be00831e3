//! Example: analyzing a README against a mock backend.
//!
//! Shows the validated path, padding of a short fact list, and fallback when
//! the model fails. Run with: `cargo run --example mock_analysis`
//! (set `RUST_LOG=readme_digest=debug` to see state transitions).

use std::sync::Arc;

use readme_digest::events::{Event, FnEventHandler};
use readme_digest::{MockBackend, ReadmeAnalyzer, RepositoryInfo};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const README: &str = "# tiny-cache\n\nAn HTTP response cache with a 5-minute TTL.";

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact())
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let mock = MockBackend::new(vec![
        "Summary: A tool that caches HTTP responses using a 5-minute TTL.\n\
         Cool fact: Uses an LRU cache with 10k entry capacity.\n\
         Cool fact: Implements request coalescing for duplicate in-flight calls.\n\
         Cool fact: Exposes Prometheus metrics on port 9090."
            .to_string(),
        "Summary: A tool that caches HTTP responses using a 5-minute TTL.\n\
         Cool fact: Uses an LRU cache with 10k entry capacity."
            .to_string(),
    ]);

    let analyzer = ReadmeAnalyzer::builder("http://unused")
        .backend(Arc::new(mock))
        .event_handler(Arc::new(FnEventHandler(|event: Event| {
            if let Event::FallbackApplied { reason } = event {
                eprintln!("[fallback] {}", reason);
            }
        })))
        .build()?;

    let repo = RepositoryInfo::from_github_url(
        "https://github.com/example/tiny-cache",
        "https://github.com/example/tiny-cache/blob/main/README.md",
    )?;
    let envelope = analyzer.analyze_repository(repo, README).await?;
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    let (padded, report) = analyzer.analyze_with_report(README).await;
    println!("\nPadded facts (normalized: {}):", report.normalized);
    for fact in padded.cool_facts() {
        println!("  - {}", fact);
    }

    let failing = ReadmeAnalyzer::builder("http://unused")
        .backend(Arc::new(MockBackend::failing("backend unavailable")))
        .build()?;
    let (fallback, report) = failing.analyze_with_report(README).await;
    println!("\nFallback summary: {}", fallback.summary());
    println!("Reason: {}", report.fallback_reason().unwrap_or("none"));

    Ok(())
}
