//! # Example: search_debounce
//!
//! Simulates a search box: every keystroke calls a slow search backend, but only the
//! latest query may answer. Earlier queries are cancelled and their results dropped.
//!
//! ## Flow
//! ```text
//! "r"  ─┐
//! "ru" ─┼─► AsyncDebounce ─► one shared Deferred ─► results for "rust"
//! "rus"─┤     (pre_call_delay = 30ms)
//! "rust"┘
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=taskrelay=debug cargo run --example search_debounce
//! ```

use std::time::Duration;

use taskrelay::{AsyncDebounce, Deferred};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const CATALOG: &[&str] = &["rust", "rustc", "rustup", "ruby", "runtime", "tokio"];

/// Slow backend; shorter prefixes take longer, so stale answers would arrive last.
async fn search_backend(ctx: CancellationToken, query: String) -> Result<Vec<String>, String> {
    let latency = Duration::from_millis(200 - 30 * query.len().min(6) as u64);
    tokio::select! {
        _ = tokio::time::sleep(latency) => {}
        _ = ctx.cancelled() => {
            println!("  backend: '{query}' cancelled");
            return Err(format!("'{query}' cancelled"));
        }
    }
    if query.is_empty() {
        return Err("empty query".to_string());
    }
    Ok(CATALOG
        .iter()
        .filter(|item| item.starts_with(&query))
        .map(|item| item.to_string())
        .collect())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let search = AsyncDebounce::builder(search_backend)
        .pre_call_delay(Duration::from_millis(30))
        .with_span(tracing::info_span!("search_box"))
        .build();

    // typing "rust", one keystroke every 20ms
    let mut last = None;
    for len in 1..="rust".len() {
        let query = "rust"[..len].to_string();
        println!("keystroke: '{query}'");
        let out = search.call(query);
        if let Some(prev) = &last {
            println!("  same pending result: {}", Deferred::ptr_eq(prev, &out));
        }
        last = Some(out);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    if let Some(out) = last {
        match out.await {
            Ok(hits) => println!("results: {hits:?}"),
            Err(e) => println!("search failed: {e}"),
        }
    }

    // a fresh cycle after the previous one settled
    let again = search.call("tok".to_string());
    println!("new cycle pending: {}", search.is_pending());
    println!("results: {:?}", again.await);
    Ok(())
}
