use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Link between a synced photo and a response/pendency pair.
/// Written once, never updated.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChecklistRespostaFoto {
    pub id: i32,
    pub checklist_resposta_id: i32,
    pub checklist_pendencia_id: i32,
    pub storage_path: String,
    pub url: String,
    pub file_size: i64,
    pub mime_type: String,
    pub metadados: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// Data for creating a photo link. Persisting it also bumps the
/// response's sync counter in the same unit of work.
#[derive(Debug, Clone)]
pub struct NewChecklistRespostaFoto {
    pub checklist_resposta_id: i32,
    pub checklist_pendencia_id: i32,
    pub storage_path: String,
    pub url: String,
    pub file_size: i64,
    pub mime_type: String,
    pub metadados: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}
