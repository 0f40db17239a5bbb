//! Persistence gateway for checklist photo reconciliation.
//!
//! The reconciliation services only talk to [`ChecklistStore`]. Every lookup
//! ignores soft-deleted rows. Errors come back as the closed [`StoreError`] set.

mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::features::checklist_photos::models::{
    ChecklistPendencia, ChecklistPreenchido, ChecklistResposta, ChecklistRespostaFoto,
    MobilePhoto, NewChecklistPendencia, NewChecklistRespostaFoto, RespostaComPendencia, Turno,
};

pub use postgres::PgChecklistStore;

/// Column guarded by the one-pendency-per-response unique index
pub const PENDENCIA_RESPOSTA_COLUMN: &str = "checklist_resposta_id";

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint name.
    #[error("Unique constraint violated: {constraint}")]
    ConstraintViolation { constraint: String },

    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// True when this is a unique violation on a constraint covering `column`
    pub fn violates(&self, column: &str) -> bool {
        matches!(self, StoreError::ConstraintViolation { constraint } if constraint.contains(column))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::ConstraintViolation {
                    constraint: db_err.constraint().unwrap_or_default().to_string(),
                }
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait ChecklistStore: Send + Sync {
    /// Non-deleted turno by id
    async fn find_turno(&self, turno_id: i32) -> StoreResult<Option<Turno>>;

    /// Non-deleted mobile photo by id
    async fn find_mobile_photo(&self, mobile_photo_id: i32) -> StoreResult<Option<MobilePhoto>>;

    /// Filled checklist identified by its client UUID within a turno
    async fn find_checklist_by_uuid(
        &self,
        uuid: Uuid,
        turno_id: i32,
    ) -> StoreResult<Option<ChecklistPreenchido>>;

    /// Filled checklist identified by its database id within a turno
    async fn find_checklist_by_id(
        &self,
        checklist_preenchido_id: i32,
        turno_id: i32,
    ) -> StoreResult<Option<ChecklistPreenchido>>;

    /// Responses of one checklist to one question, optionally narrowed by
    /// the selected option. Ordered by id, each with its pendency.
    async fn find_respostas(
        &self,
        checklist_preenchido_id: i32,
        pergunta_id: i32,
        opcao_resposta_id: Option<i32>,
    ) -> StoreResult<Vec<RespostaComPendencia>>;

    /// Responses to one question across every checklist of a turno
    async fn find_respostas_by_turno(
        &self,
        turno_id: i32,
        pergunta_id: i32,
    ) -> StoreResult<Vec<RespostaComPendencia>>;

    async fn find_pendencia_by_resposta(
        &self,
        checklist_resposta_id: i32,
    ) -> StoreResult<Option<ChecklistPendencia>>;

    /// Insert a pendency. A second pendency for the same response fails with
    /// [`StoreError::ConstraintViolation`] naming [`PENDENCIA_RESPOSTA_COLUMN`].
    async fn create_pendencia(&self, data: NewChecklistPendencia)
        -> StoreResult<ChecklistPendencia>;

    /// Insert the photo link and, atomically with it, increment
    /// `fotos_sincronizadas` and clear `aguardando_foto` on the response.
    async fn link_photo(&self, data: NewChecklistRespostaFoto)
        -> StoreResult<ChecklistRespostaFoto>;

    /// Responses in a turno still flagged as waiting for a photo
    async fn list_awaiting_photo(&self, turno_id: i32) -> StoreResult<Vec<ChecklistResposta>>;
}
