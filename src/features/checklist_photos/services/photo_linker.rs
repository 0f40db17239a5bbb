use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::features::checklist_photos::models::{
    ChecklistRespostaFoto, MobilePhoto, NewChecklistRespostaFoto,
};
use crate::features::checklist_photos::store::{ChecklistStore, StoreResult};

/// Which correlation keys located the response a photo is linked to.
/// Recorded in `metadados` as the audit trail of the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCorrelation {
    ChecklistUuid(Uuid),
    SemUuidFallback,
    LegacyMapping {
        checklist_preenchido_id: i32,
        opcao_resposta_id: i32,
    },
}

impl LinkCorrelation {
    pub fn method(&self) -> &'static str {
        match self {
            LinkCorrelation::ChecklistUuid(_) => "uuid",
            LinkCorrelation::SemUuidFallback => "sem-uuid-fallback",
            LinkCorrelation::LegacyMapping { .. } => "mapeamento-legado",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinkContext {
    pub turno_id: i32,
    pub pergunta_id: i32,
    pub correlation: LinkCorrelation,
}

/// Build the `metadados` JSON stored on the link row
pub fn build_metadata(photo: &MobilePhoto, context: &LinkContext) -> serde_json::Value {
    let mut metadata = json!({
        "mobilePhotoId": photo.id,
        "tipo": photo.tipo,
        "capturedAt": photo.captured_at,
        "turnoId": context.turno_id,
        "perguntaId": context.pergunta_id,
        "metodoVinculacao": context.correlation.method(),
    });

    match &context.correlation {
        LinkCorrelation::ChecklistUuid(uuid) => {
            metadata["checklistUuid"] = json!(uuid);
        }
        LinkCorrelation::SemUuidFallback => {}
        LinkCorrelation::LegacyMapping {
            checklist_preenchido_id,
            opcao_resposta_id,
        } => {
            metadata["checklistPreenchidoId"] = json!(checklist_preenchido_id);
            metadata["opcaoRespostaId"] = json!(opcao_resposta_id);
        }
    }

    metadata
}

/// Attaches an uploaded photo to a response/pendency pair
pub struct PhotoLinker {
    store: Arc<dyn ChecklistStore>,
    actor: String,
}

impl PhotoLinker {
    pub fn new(store: Arc<dyn ChecklistStore>, actor: impl Into<String>) -> Self {
        Self {
            store,
            actor: actor.into(),
        }
    }

    /// Create the link row and bump the response's sync counter.
    /// Both writes happen in one store transaction.
    pub async fn link(
        &self,
        checklist_resposta_id: i32,
        checklist_pendencia_id: i32,
        photo: &MobilePhoto,
        context: &LinkContext,
    ) -> StoreResult<ChecklistRespostaFoto> {
        let data = NewChecklistRespostaFoto {
            checklist_resposta_id,
            checklist_pendencia_id,
            storage_path: photo.storage_path.clone(),
            url: photo.url.clone(),
            file_size: i64::from(photo.file_size),
            mime_type: photo.mime_type.clone(),
            metadados: build_metadata(photo, context),
            created_at: Utc::now(),
            created_by: self.actor.clone(),
        };

        let foto = self.store.link_photo(data).await?;

        tracing::info!(
            "Photo {} linked to resposta {} / pendencia {} via {}",
            photo.id,
            checklist_resposta_id,
            checklist_pendencia_id,
            context.correlation.method()
        );

        Ok(foto)
    }
}
