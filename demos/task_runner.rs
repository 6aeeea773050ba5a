//! # Example: task_runner
//!
//! Submits a burst of jobs to a [`TaskRunner`] capped at three workers and reports
//! progress through its listener registries.
//!
//! Demonstrates how to:
//! - Submit named tasks ([`TaskFn`]) and anonymous closures (`submit_fn`).
//! - Observe `task_completed` / `task_error` / `all_tasks_completed`.
//! - Wait for the runner to drain with `wait_for_completion`.
//!
//! ## Flow
//! ```text
//! submit ×10 ──► queue ──► ≤3 workers
//!     ├─► task_completed   (per success)
//!     ├─► task_error       (job-4 fails, job-7 panics)
//!     └─► all_tasks_completed ──► wait_for_completion() resolves
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=taskrelay=debug cargo run --example task_runner
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use taskrelay::{RunnerConfig, TaskError, TaskFailure, TaskFn, TaskRef, TaskRunner};
use tracing_subscriber::EnvFilter;

/// Simulated unit of work; some ids fail on purpose.
async fn process(id: u64) -> Result<(), TaskError> {
    tokio::time::sleep(Duration::from_millis(50 + (id % 3) * 40)).await;
    match id {
        4 => Err(TaskError::fail(format!("job-{id}: upstream rejected payload"))),
        7 => panic!("job-{id}: corrupted state"),
        _ => Ok(()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let runner = TaskRunner::builder(RunnerConfig::with_max_concurrent_tasks(3))
        .with_span(tracing::info_span!("demo_runner"))
        .build();

    let completed = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&completed);
    runner.events().task_completed.add_listener(move |task: &TaskRef| {
        let n = c.fetch_add(1, Ordering::SeqCst) + 1;
        println!("[completed] {} ({n} so far)", task.name());
        Ok(())
    });
    runner.events().task_error.add_listener(|failure: &TaskFailure| {
        println!(
            "[error] {} -> {} ({})",
            failure.task.name(),
            failure.error.as_message(),
            failure.error.as_label()
        );
        Ok(())
    });
    runner.events().all_tasks_completed.once(|_: &()| {
        println!("[idle] all tasks completed");
        Ok(())
    });

    let done = runner.wait_for_completion();
    for id in 0..8 {
        runner.submit_task(TaskFn::arc(format!("job-{id}"), move || process(id)));
    }
    for _ in 0..2 {
        runner.submit_fn(|| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<(), TaskError>(())
        });
    }
    println!(
        "submitted: active_workers={} pending={}",
        runner.active_workers(),
        runner.pending_tasks()
    );

    done.await;
    println!(
        "done: completed={} idle={}",
        completed.load(Ordering::SeqCst),
        runner.is_idle()
    );
    Ok(())
}
