use serde::Serialize;
use utoipa::ToSchema;

/// One photo link produced by a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LinkedPhoto {
    pub checklist_resposta_id: i32,
    pub checklist_pendencia_id: i32,
    pub checklist_resposta_foto_id: i32,
    /// Whether the pendency was created by this run
    pub pendencia_created: bool,
}

/// Lookup that came back empty and ended the run early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    TurnoNotFound,
    ChecklistNotFound,
    RespostaNotFound,
    PhotoNotFound,
    PendenciaNotFound,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::TurnoNotFound => write!(f, "turno_not_found"),
            SkipReason::ChecklistNotFound => write!(f, "checklist_not_found"),
            SkipReason::RespostaNotFound => write!(f, "resposta_not_found"),
            SkipReason::PhotoNotFound => write!(f, "photo_not_found"),
            SkipReason::PendenciaNotFound => write!(f, "pendencia_not_found"),
        }
    }
}

/// Result of one reconciliation strategy invocation.
///
/// Strategies never return `Err`: unexpected store errors are logged and
/// reported as [`ReconciliationOutcome::Failed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    Linked(Vec<LinkedPhoto>),
    SkippedNoMatch(SkipReason),
    SkippedRaceUnresolved,
    Failed(String),
}

impl ReconciliationOutcome {
    pub fn links(&self) -> &[LinkedPhoto] {
        match self {
            ReconciliationOutcome::Linked(links) => links,
            _ => &[],
        }
    }

    pub fn is_linked(&self) -> bool {
        matches!(self, ReconciliationOutcome::Linked(_))
    }
}
