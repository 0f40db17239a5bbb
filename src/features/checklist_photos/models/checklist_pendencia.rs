use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;

/// Pendency status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "checklist_pendencia_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PendenciaStatus {
    AguardandoTratamento,
    EmTratamento,
    Tratada,
    RegistroIncorreto,
}

impl std::fmt::Display for PendenciaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendenciaStatus::AguardandoTratamento => write!(f, "AGUARDANDO_TRATAMENTO"),
            PendenciaStatus::EmTratamento => write!(f, "EM_TRATAMENTO"),
            PendenciaStatus::Tratada => write!(f, "TRATADA"),
            PendenciaStatus::RegistroIncorreto => write!(f, "REGISTRO_INCORRETO"),
        }
    }
}

/// Follow-up item raised by a disapproving checklist answer.
/// At most one per `checklist_resposta_id`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChecklistPendencia {
    pub id: i32,
    pub checklist_resposta_id: i32,
    pub checklist_preenchido_id: i32,
    pub turno_id: i32,
    pub status: PendenciaStatus,
    pub observacao_problema: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// Data for creating a new pendency
#[derive(Debug, Clone)]
pub struct NewChecklistPendencia {
    pub checklist_resposta_id: i32,
    pub checklist_preenchido_id: i32,
    pub turno_id: i32,
    pub status: PendenciaStatus,
    pub observacao_problema: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}
