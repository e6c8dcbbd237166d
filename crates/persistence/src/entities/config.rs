//! Configuration entity (database row mapping).

use serde_json::Value;
use sqlx::FromRow;

/// Database row mapping for the configs table.
#[derive(Debug, Clone, FromRow)]
pub struct ConfigEntity {
    pub ns: String,
    pub key: String,
    pub value: Value,
}

impl ConfigEntity {
    pub fn into_pair(self) -> (String, Value) {
        (self.key, self.value)
    }
}
