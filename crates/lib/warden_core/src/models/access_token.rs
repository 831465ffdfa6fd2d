//! Persisted access-token records, one per issued signed token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-side record of an issued access token. A signed token is only
/// honored while its record is still present and unexpired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub trusted_app_id: Uuid,
    pub token: String,
    pub expire_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_at > now
    }
}
