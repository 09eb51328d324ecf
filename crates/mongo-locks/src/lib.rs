//! Lease-based distributed locks on MongoDB.
//!
//! This crate guarantees at most one concurrent execution of a named
//! operation across processes and hosts that share a MongoDB deployment —
//! scheduled jobs, cron-like tasks, cache warmers — with no coordination
//! service beyond the database itself.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mongo_locks::{LockManager, LockManagerOptions, MongoLockStore};
//! use mongodb::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//!     let store = MongoLockStore::from_client(&client);
//!     let locks = LockManager::new(store, LockManagerOptions::new("my_project"))?;
//!
//!     if locks.acquire("nightly-sync").await? {
//!         // At most one process runs this at a time.
//!         println!("running the nightly sync");
//!         locks.release("nightly-sync").await?;
//!     } else {
//!         println!("another process holds the lock, skipping");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # How it works
//!
//! Each acquisition is a single atomic conditional write: the lock document
//! is replaced only when it is missing or its lease has expired, and the
//! post-write document tells the caller whether its freshly generated
//! holder token won. While a lease is held, a background heartbeat task
//! renews it at a third of the lease duration. A holder that crashes simply
//! stops renewing; its lease expires and any other caller takes the lock
//! over. Nothing stronger than MongoDB's single-document atomicity is
//! assumed.
//!
//! # Scoped and wrapped use
//!
//! ```rust,no_run
//! # use mongo_locks::{LockManager, LockManagerOptions, MongoLockStore, ScopeOptions};
//! # async fn demo(locks: mongo_locks::MongoLocks) -> Result<(), mongo_locks::LockError> {
//! // Run a closure only while the lock is held; released on every exit path.
//! locks
//!     .with_lock("rebuild-cache", ScopeOptions::new(), || async {
//!         // protected region
//!     })
//!     .await?;
//!
//! // Or lock under the callee's own name.
//! async fn sync() { /* protected */ }
//! mongo_locks::locked!(locks, sync).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Organization
//!
//! This is a meta-crate that re-exports types from:
//! - `mongo-locks-core`: store contract, lock manager, scoped API
//! - `mongo-locks-mongo`: the MongoDB store backend
//!
//! For fine-grained control, you can depend on individual crates instead.

// Re-export core types and traits
pub use mongo_locks_core::*;

pub use mongo_locks_core::locked;

// Re-export the MongoDB backend
#[allow(ambiguous_glob_reexports)]
pub use mongo_locks_mongo::*;
