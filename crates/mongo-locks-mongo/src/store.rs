use std::time::Duration;

use mongo_locks_core::error::{LockError, LockResult};
use mongo_locks_core::store::{HeldLease, LockRecord, LockStore};
use mongodb::{
    Client, Collection, Database,
    bson::{DateTime, Document, doc},
    error::{ErrorKind, WriteFailure},
    options::ReturnDocument,
};

use crate::document::LockDocument;

/// Database used when constructing from a bare client.
pub const DEFAULT_DATABASE: &str = "mongo_locks";

/// Collection holding the lock records.
pub const DEFAULT_COLLECTION: &str = "locks";

/// MongoDB-backed lock store, one document per namespaced key.
///
/// Mutual exclusion rests entirely on MongoDB's single-document atomicity:
/// the claim is one `findAndModify` with an aggregation pipeline that only
/// rewrites the document when it is missing or expired, evaluated against
/// the server's own clock (`$$NOW`).
#[derive(Debug, Clone)]
pub struct MongoLockStore {
    collection: Collection<LockDocument>,
}

impl MongoLockStore {
    /// Creates a store over the default collection of `database`.
    pub fn new(database: Database) -> Self {
        Self::with_collection(database, DEFAULT_COLLECTION)
    }

    /// Creates a store over a named collection of `database`.
    pub fn with_collection(database: Database, collection: &str) -> Self {
        Self {
            collection: database.collection(collection),
        }
    }

    /// Creates a store over the default database and collection of `client`.
    pub fn from_client(client: &Client) -> Self {
        Self::new(client.database(DEFAULT_DATABASE))
    }
}

impl LockStore for MongoLockStore {
    async fn claim(&self, id: &str, token: &str, lease: Duration) -> LockResult<Option<LockRecord>> {
        let lease_ms = lease.as_millis() as i64;

        // expired := ifNull(expiresAt, epoch) <= $$NOW
        let epoch = DateTime::from_millis(0);
        let expired_or_missing = doc! {
            "$lte": [
                { "$ifNull": ["$expiresAt", epoch] },
                "$$NOW"
            ]
        };

        let new_expires_at = doc! {
            "$dateAdd": {
                "startDate": "$$NOW",
                "unit": "millisecond",
                "amount": lease_ms
            }
        };

        let set_stage = doc! {
            "$set": {
                "lockId": {
                    "$cond": [&expired_or_missing, token, "$lockId"]
                },
                "expiresAt": {
                    "$cond": [&expired_or_missing, &new_expires_at, "$expiresAt"]
                }
            }
        };

        let result = self
            .collection
            .find_one_and_update(doc! { "_id": id }, vec![set_stage])
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await;

        match result {
            Ok(Some(document)) => Ok(Some(record_from(document))),
            Ok(None) => Ok(None),
            // Two claims upserting the same missing _id race on the unique
            // index; the loser's duplicate-key conflict means exactly that.
            Err(error) if is_duplicate_key(&error) => Ok(None),
            Err(error) => Err(LockError::store(error)),
        }
    }

    async fn release(&self, id: &str, token: &str) -> LockResult<()> {
        self.collection
            .delete_one(doc! { "_id": id, "lockId": token })
            .await
            .map_err(LockError::store)?;
        Ok(())
    }

    async fn extend(&self, held: &[HeldLease], lease: Duration) -> LockResult<u64> {
        if held.is_empty() {
            return Ok(0);
        }
        let lease_ms = lease.as_millis() as i64;

        let still_ours: Vec<Document> = held
            .iter()
            .map(|entry| doc! { "_id": &entry.id, "lockId": &entry.token })
            .collect();

        let extend_stage = doc! {
            "$set": {
                "expiresAt": {
                    "$dateAdd": {
                        "startDate": "$$NOW",
                        "unit": "millisecond",
                        "amount": lease_ms
                    }
                }
            }
        };

        let result = self
            .collection
            .update_many(doc! { "$or": still_ours }, vec![extend_stage])
            .await
            .map_err(LockError::store)?;

        Ok(result.modified_count)
    }

    async fn find(&self, id: &str) -> LockResult<Option<LockRecord>> {
        let document = self
            .collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(LockError::store)?;
        Ok(document.map(record_from))
    }
}

fn record_from(document: LockDocument) -> LockRecord {
    LockRecord {
        id: document.id,
        holder_token: document.lock_id,
        expires_at: document.expires_at.to_system_time(),
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    const DUPLICATE_KEY: i32 = 11000;
    match &*error.kind {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}
