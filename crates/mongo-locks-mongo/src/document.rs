use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct LockDocument {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "lockId")]
    pub lock_id: String,

    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime,
}
