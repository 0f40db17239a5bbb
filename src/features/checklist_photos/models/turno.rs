use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A work shift
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Turno {
    pub id: i32,
    pub data_inicio: DateTime<Utc>,
    pub data_fim: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A filled checklist belonging to a turno
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChecklistPreenchido {
    pub id: i32,
    pub uuid: Uuid,
    pub turno_id: i32,
    pub deleted_at: Option<DateTime<Utc>>,
}
