//! Example: acquiring and releasing locks directly.
//!
//! Run with: `cargo run --example locking`
//!
//! Requires a MongoDB server. Set MONGODB_URI environment variable
//! or modify the URL below.

use std::time::Duration;

use mongo_locks::{LockManager, LockManagerOptions, MongoLockStore, ScopeOptions};
use mongodb::Client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let uri = std::env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    println!("Connecting to MongoDB...");
    let client = Client::with_uri_str(&uri).await?;
    let store = MongoLockStore::from_client(&client);

    let locks = LockManager::new(
        store,
        LockManagerOptions::new("example_project").lease_duration(Duration::from_secs(30)),
    )?;

    // Plain acquire/release.
    if locks.acquire("op1").await? {
        println!("Lock acquired, working...");
        tokio::time::sleep(Duration::from_secs(2)).await;
        locks.release("op1").await?;
        println!("Lock released");
    } else {
        println!("Another process holds op1, skipping");
    }

    // Scoped acquisition: the guard reports the outcome and the caller
    // skips its own logic when the lock was not granted.
    let guard = locks.lock_scope("op1", ScopeOptions::new()).await?;
    if guard.acquired() {
        println!("Scoped work...");
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    guard.release().await?;

    // Bounded wait: keep polling for up to five seconds, then give up.
    let opts = ScopeOptions::new().wait_for(Duration::from_secs(5));
    match locks.with_lock("op1", opts, do_work).await? {
        Some(()) => println!("Work completed under lock"),
        None => println!("Gave up waiting for op1"),
    }

    locks.shutdown(true).await?;
    Ok(())
}

async fn do_work() {
    println!("Working...");
    tokio::time::sleep(Duration::from_secs(1)).await;
    println!("...Done");
}
