use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::studio::document::PromptDocument;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub name: String,
    pub payload: Json<PromptDocument>,
    pub updated_at: DateTime<Utc>,
}

/// Listing entry; omits the document body.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProjectSummaryRow {
    pub id: Uuid,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}
