use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Photo persisted by the mobile upload handler. Read-only here.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MobilePhoto {
    pub id: i32,
    pub turno_id: i32,
    pub tipo: String,
    pub storage_path: String,
    pub url: String,
    pub file_size: i32,
    pub mime_type: String,
    pub captured_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}
