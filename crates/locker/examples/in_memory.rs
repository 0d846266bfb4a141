//! Example: several workers contending for the same in-memory lock
//!
//! This example demonstrates:
//! 1. Implementing `AcquireFn`/`ReleaseFn` on a backend type
//! 2. Exponential delay with jitter between attempts
//! 3. Telling an exhausted budget apart from a fatal error
//!
//! Run with:
//! ```bash
//! RUST_LOG=locker=trace cargo run -p locker --example in_memory
//! ```

use async_trait::async_trait;
use locker::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// A toy lock table. Keys starting with `readonly/` cannot be locked.
#[derive(Clone, Default)]
struct LockTable {
    held: Arc<Mutex<HashSet<String>>>,
}

#[async_trait]
impl AcquireFn<String> for LockTable {
    async fn acquire(&self, _ctx: &CancellationToken, key: &String) -> Result<(), AcquireError> {
        if key.starts_with("readonly/") {
            return Err(AcquireError::failed(format!("{} is read-only", key)));
        }
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if held.insert(key.clone()) {
            Ok(())
        } else {
            Err(AcquireError::AlreadyLocked)
        }
    }
}

#[async_trait]
impl ReleaseFn<String> for LockTable {
    async fn release(&self, _ctx: &CancellationToken, key: &String) -> Result<(), BoxError> {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if held.remove(key) {
            Ok(())
        } else {
            Err(format!("{} was not locked", key).into())
        }
    }
}

fn build_locker(table: &LockTable, max_attempts: u32) -> Locker<String> {
    Locker::builder(table.clone(), table.clone())
        .delay(
            ExponentialDelay::builder()
                .initial_delay(Duration::from_millis(5))
                .max_delay(Duration::from_millis(80))
                .jitter(0.2)
                .build(),
        )
        .max_attempts(max_attempts)
        .build()
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("locker=debug")),
        )
        .init();

    let table = LockTable::default();
    let locker = Arc::new(build_locker(&table, 20));
    let ctx = CancellationToken::new();

    println!("\n=== Four workers, one key ===\n");
    let start = Instant::now();
    let mut workers = Vec::new();
    for id in 0..4 {
        let locker = Arc::clone(&locker);
        let ctx = ctx.clone();
        workers.push(tokio::spawn(async move {
            let lock = locker
                .acquire_with(
                    &ctx,
                    "reports/daily".to_string(),
                    vec![with_label(format!("worker-{}", id))],
                )
                .await?;
            println!(
                "  {} got the lock after {} attempt(s)",
                lock.label().unwrap_or("?"),
                lock.attempts()
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
            lock.release(&ctx).await
        }));
    }
    for worker in workers {
        if let Err(err) = worker.await? {
            println!("  worker failed: {}", err);
        }
    }
    println!("  all workers done in {:?}", start.elapsed());

    println!("\n=== Budget exhausted ===\n");
    let impatient = build_locker(&table, 3);
    let held = impatient.acquire(&ctx, "reports/weekly".to_string()).await?;
    match impatient.acquire(&ctx, "reports/weekly".to_string()).await {
        Err(err) if err.is_max_attempts_reached() => println!("  gave up: {}", err),
        other => println!("  unexpected: {:?}", other.map(|l| l.attempts())),
    }
    held.release(&ctx).await?;

    println!("\n=== Fatal error ===\n");
    match impatient.acquire(&ctx, "readonly/archive".to_string()).await {
        Err(Error::AcquireFailed { key, source }) => {
            println!("  not retried for {}: {}", key, source)
        }
        other => println!("  unexpected: {:?}", other.map(|l| l.attempts())),
    }

    Ok(())
}
