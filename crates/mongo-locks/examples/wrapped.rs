//! Example: wrapping callables, with the lock key taken from the callee's
//! own name, and composing wrappers as ordinary functions.
//!
//! Run with: `cargo run --example wrapped`

use std::future::Future;

use mongo_locks::{LockManager, LockManagerOptions, MongoLockStore, ScopeOptions, locked};
use mongodb::Client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let uri = std::env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let client = Client::with_uri_str(&uri).await?;

    let locks = LockManager::new(
        MongoLockStore::from_client(&client),
        LockManagerOptions::new("example_project"),
    )?;

    // The lock key is the callee's name: this acquires "op1".
    locked!(locks, op1).await?;

    // Explicit key, raising instead of silently skipping.
    let outcome = locks
        .with_lock("op1", ScopeOptions::new().raise_on_failure(), op1)
        .await;
    println!("Explicit key outcome: {:?}", outcome.is_ok());

    // Wrapper layers compose as plain functions: announce() decorates op1
    // and the composition runs under the lock as a whole.
    locks
        .with_lock("op1", ScopeOptions::new(), || announce("op1", op1()))
        .await?;

    locks.shutdown(true).await?;
    Ok(())
}

async fn op1() {
    println!("Working...");
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    println!("...Done");
}

async fn announce<F: Future>(name: &str, f: F) -> F::Output {
    println!("Hello from the second wrapper, running {name}!");
    f.await
}
