pub mod document;
pub mod store;

pub use store::{DEFAULT_COLLECTION, DEFAULT_DATABASE, MongoLockStore};

/// Lock manager over the MongoDB store.
pub type MongoLocks = mongo_locks_core::LockManager<MongoLockStore>;
