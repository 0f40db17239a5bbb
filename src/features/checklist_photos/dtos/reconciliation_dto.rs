use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::checklist_photos::models::ChecklistResposta;
use crate::features::checklist_photos::services::{
    LinkedPhoto, PhotoCorrelation, ReconciliationOutcome,
};

/// Correlation keys sent along with an uploaded mobile photo
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReconcilePhotoDto {
    /// Turno the photo was taken in
    #[validate(range(min = 1, message = "turno_id must be positive"))]
    pub turno_id: i32,
    /// Checklist question the photo answers
    #[validate(range(min = 1, message = "pergunta_id must be positive"))]
    pub pergunta_id: i32,
    /// Client UUID of the filled checklist, when the app knows it
    pub checklist_uuid: Option<Uuid>,
    /// Legacy clients: filled checklist id (requires opcao_resposta_id)
    #[validate(range(min = 1, message = "checklist_preenchido_id must be positive"))]
    pub checklist_preenchido_id: Option<i32>,
    /// Legacy clients: selected answer option
    #[validate(range(min = 1, message = "opcao_resposta_id must be positive"))]
    pub opcao_resposta_id: Option<i32>,
}

impl ReconcilePhotoDto {
    pub fn into_correlation(self, mobile_photo_id: i32) -> PhotoCorrelation {
        PhotoCorrelation {
            mobile_photo_id,
            turno_id: self.turno_id,
            pergunta_id: self.pergunta_id,
            checklist_uuid: self.checklist_uuid,
            checklist_preenchido_id: self.checklist_preenchido_id,
            opcao_resposta_id: self.opcao_resposta_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKindDto {
    Linked,
    SkippedNoMatch,
    SkippedRaceUnresolved,
    Failed,
}

/// Result of a reconciliation request
#[derive(Debug, Serialize, ToSchema)]
pub struct ReconciliationResultDto {
    pub outcome: OutcomeKindDto,
    /// Why nothing was linked, for skipped and failed outcomes
    pub reason: Option<String>,
    pub links: Vec<LinkedPhoto>,
}

impl From<ReconciliationOutcome> for ReconciliationResultDto {
    fn from(outcome: ReconciliationOutcome) -> Self {
        match outcome {
            ReconciliationOutcome::Linked(links) => Self {
                outcome: OutcomeKindDto::Linked,
                reason: None,
                links,
            },
            ReconciliationOutcome::SkippedNoMatch(reason) => Self {
                outcome: OutcomeKindDto::SkippedNoMatch,
                reason: Some(reason.to_string()),
                links: Vec::new(),
            },
            ReconciliationOutcome::SkippedRaceUnresolved => Self {
                outcome: OutcomeKindDto::SkippedRaceUnresolved,
                reason: Some("pendencia_race_unresolved".to_string()),
                links: Vec::new(),
            },
            ReconciliationOutcome::Failed(error) => Self {
                outcome: OutcomeKindDto::Failed,
                reason: Some(error),
                links: Vec::new(),
            },
        }
    }
}

/// Response still waiting for its photo
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AwaitingPhotoDto {
    pub checklist_resposta_id: i32,
    pub checklist_preenchido_id: i32,
    pub pergunta_id: i32,
    pub opcao_resposta_id: i32,
    pub fotos_sincronizadas: i32,
}

impl From<ChecklistResposta> for AwaitingPhotoDto {
    fn from(resposta: ChecklistResposta) -> Self {
        Self {
            checklist_resposta_id: resposta.id,
            checklist_preenchido_id: resposta.checklist_preenchido_id,
            pergunta_id: resposta.pergunta_id,
            opcao_resposta_id: resposta.opcao_resposta_id,
            fotos_sincronizadas: resposta.fotos_sincronizadas,
        }
    }
}
