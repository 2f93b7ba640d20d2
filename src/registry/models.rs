use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A block known to the registry: one vector in the remote index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RegisteredBlock {
    pub id: String,
    pub title: String,
    pub created_date: NaiveDateTime,
}

/// Insert payload for a block registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlock {
    pub id: String,
    pub title: String,
}

/// A document title with its registered block count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TitleSummary {
    pub title: String,
    pub block_count: i64,
}
