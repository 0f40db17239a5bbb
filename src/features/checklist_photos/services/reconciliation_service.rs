use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::checklist_photos::models::{
    ChecklistResposta, MobilePhoto, RespostaComPendencia,
};
use crate::features::checklist_photos::services::outcome::{
    LinkedPhoto, ReconciliationOutcome, SkipReason,
};
use crate::features::checklist_photos::services::pendency_resolver::{
    PendencyResolution, PendencyResolver,
};
use crate::features::checklist_photos::services::photo_linker::{
    LinkContext, LinkCorrelation, PhotoLinker,
};
use crate::features::checklist_photos::store::{ChecklistStore, StoreError, StoreResult};

/// Observation recorded on pendencies opened by the UUID strategy
pub const OBSERVACAO_FOTO_REPROVACAO: &str = "Pendência criada a partir de foto de reprovação";

/// Keys supplied by the mobile client for one uploaded photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoCorrelation {
    pub mobile_photo_id: i32,
    pub turno_id: i32,
    pub pergunta_id: i32,
    pub checklist_uuid: Option<Uuid>,
    pub checklist_preenchido_id: Option<i32>,
    pub opcao_resposta_id: Option<i32>,
}

/// Strategy picked for a [`PhotoCorrelation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationStrategy {
    Uuid(Uuid),
    LegacyMapping {
        checklist_preenchido_id: i32,
        opcao_resposta_id: i32,
    },
    SemUuid,
}

impl PhotoCorrelation {
    /// A checklist UUID wins; a full legacy key pair comes next; anything
    /// else falls back to the turno/pergunta lookup.
    pub fn strategy(&self) -> CorrelationStrategy {
        match (
            self.checklist_uuid,
            self.checklist_preenchido_id,
            self.opcao_resposta_id,
        ) {
            (Some(uuid), _, _) => CorrelationStrategy::Uuid(uuid),
            (None, Some(checklist_preenchido_id), Some(opcao_resposta_id)) => {
                CorrelationStrategy::LegacyMapping {
                    checklist_preenchido_id,
                    opcao_resposta_id,
                }
            }
            _ => CorrelationStrategy::SemUuid,
        }
    }
}

/// Matches uploaded mobile photos to checklist responses and their pendencies
pub struct PhotoReconciliationService {
    store: Arc<dyn ChecklistStore>,
    resolver: PendencyResolver,
    linker: PhotoLinker,
}

impl PhotoReconciliationService {
    pub fn new(store: Arc<dyn ChecklistStore>, actor: &str) -> Self {
        Self {
            resolver: PendencyResolver::new(Arc::clone(&store), actor),
            linker: PhotoLinker::new(Arc::clone(&store), actor),
            store,
        }
    }

    /// Run the strategy selected by the supplied keys
    #[allow(deprecated)]
    pub async fn reconcile(&self, correlation: &PhotoCorrelation) -> ReconciliationOutcome {
        match correlation.strategy() {
            CorrelationStrategy::Uuid(uuid) => {
                self.process_with_uuid(
                    correlation.mobile_photo_id,
                    correlation.turno_id,
                    uuid,
                    correlation.pergunta_id,
                )
                .await
            }
            CorrelationStrategy::LegacyMapping {
                checklist_preenchido_id,
                opcao_resposta_id,
            } => {
                self.process_with_mapping(
                    correlation.mobile_photo_id,
                    correlation.turno_id,
                    checklist_preenchido_id,
                    correlation.pergunta_id,
                    opcao_resposta_id,
                )
                .await
            }
            CorrelationStrategy::SemUuid => {
                self.process_without_uuid(
                    correlation.mobile_photo_id,
                    correlation.turno_id,
                    correlation.pergunta_id,
                )
                .await
            }
        }
    }

    /// Link a photo to the response of `pergunta_id` in the checklist
    /// identified by `checklist_uuid`, opening a pendency if needed.
    pub async fn process_with_uuid(
        &self,
        mobile_photo_id: i32,
        turno_id: i32,
        checklist_uuid: Uuid,
        pergunta_id: i32,
    ) -> ReconciliationOutcome {
        let result = self
            .try_process_with_uuid(mobile_photo_id, turno_id, checklist_uuid, pergunta_id)
            .await;
        absorb_failure("uuid", mobile_photo_id, result)
    }

    /// Fallback for clients that cannot send the checklist UUID: links the
    /// photo to every response of `pergunta_id` in the turno.
    pub async fn process_without_uuid(
        &self,
        mobile_photo_id: i32,
        turno_id: i32,
        pergunta_id: i32,
    ) -> ReconciliationOutcome {
        let result = self
            .try_process_without_uuid(mobile_photo_id, turno_id, pergunta_id)
            .await;
        absorb_failure("sem-uuid", mobile_photo_id, result)
    }

    /// Legacy lookup by `(pergunta_id, opcao_resposta_id)`. Only links to a
    /// pendency that already exists.
    #[deprecated(note = "use process_with_uuid")]
    pub async fn process_with_mapping(
        &self,
        mobile_photo_id: i32,
        turno_id: i32,
        checklist_preenchido_id: i32,
        pergunta_id: i32,
        opcao_resposta_id: i32,
    ) -> ReconciliationOutcome {
        let result = self
            .try_process_with_mapping(
                mobile_photo_id,
                turno_id,
                checklist_preenchido_id,
                pergunta_id,
                opcao_resposta_id,
            )
            .await;
        absorb_failure("mapeamento", mobile_photo_id, result)
    }

    /// Responses of a turno still waiting for their photo
    pub async fn list_awaiting_photo(&self, turno_id: i32) -> Result<Vec<ChecklistResposta>> {
        if self.store.find_turno(turno_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Turno {} not found", turno_id)));
        }

        Ok(self.store.list_awaiting_photo(turno_id).await?)
    }

    async fn try_process_with_uuid(
        &self,
        mobile_photo_id: i32,
        turno_id: i32,
        checklist_uuid: Uuid,
        pergunta_id: i32,
    ) -> StoreResult<ReconciliationOutcome> {
        if self.store.find_turno(turno_id).await?.is_none() {
            tracing::error!("Turno {} not found for photo {}", turno_id, mobile_photo_id);
            return Ok(ReconciliationOutcome::SkippedNoMatch(SkipReason::TurnoNotFound));
        }

        let Some(checklist) = self
            .store
            .find_checklist_by_uuid(checklist_uuid, turno_id)
            .await?
        else {
            tracing::warn!(
                "Checklist {} not found in turno {} for photo {}",
                checklist_uuid,
                turno_id,
                mobile_photo_id
            );
            return Ok(ReconciliationOutcome::SkippedNoMatch(
                SkipReason::ChecklistNotFound,
            ));
        };

        let Some(resposta) = self
            .store
            .find_respostas(checklist.id, pergunta_id, None)
            .await?
            .into_iter()
            .next()
        else {
            tracing::warn!(
                "No resposta for pergunta {} in checklist {} (photo {})",
                pergunta_id,
                checklist_uuid,
                mobile_photo_id
            );
            return Ok(ReconciliationOutcome::SkippedNoMatch(
                SkipReason::RespostaNotFound,
            ));
        };

        // Looked up before the resolver runs so a missing photo writes nothing
        let Some(photo) = self.store.find_mobile_photo(mobile_photo_id).await? else {
            tracing::error!("Mobile photo {} not found", mobile_photo_id);
            return Ok(ReconciliationOutcome::SkippedNoMatch(SkipReason::PhotoNotFound));
        };

        let resolution = self
            .resolver
            .resolve_or_create(&resposta, turno_id, Some(OBSERVACAO_FOTO_REPROVACAO))
            .await?;

        let context = LinkContext {
            turno_id,
            pergunta_id,
            correlation: LinkCorrelation::ChecklistUuid(checklist_uuid),
        };

        match self.link_resolved(&resposta, &resolution, &photo, &context).await? {
            Some(linked) => Ok(ReconciliationOutcome::Linked(vec![linked])),
            None => Ok(ReconciliationOutcome::SkippedRaceUnresolved),
        }
    }

    async fn try_process_without_uuid(
        &self,
        mobile_photo_id: i32,
        turno_id: i32,
        pergunta_id: i32,
    ) -> StoreResult<ReconciliationOutcome> {
        let Some(photo) = self.store.find_mobile_photo(mobile_photo_id).await? else {
            tracing::error!("Mobile photo {} not found", mobile_photo_id);
            return Ok(ReconciliationOutcome::SkippedNoMatch(SkipReason::PhotoNotFound));
        };

        let respostas = self
            .store
            .find_respostas_by_turno(turno_id, pergunta_id)
            .await?;

        if respostas.is_empty() {
            tracing::warn!(
                "No resposta for pergunta {} in turno {} (photo {}, sem-uuid)",
                pergunta_id,
                turno_id,
                mobile_photo_id
            );
            return Ok(ReconciliationOutcome::SkippedNoMatch(
                SkipReason::RespostaNotFound,
            ));
        }

        tracing::debug!(
            "Sem-uuid fallback matched {} respostas for photo {}",
            respostas.len(),
            mobile_photo_id
        );

        let context = LinkContext {
            turno_id,
            pergunta_id,
            correlation: LinkCorrelation::SemUuidFallback,
        };

        let mut links = Vec::with_capacity(respostas.len());
        let mut unresolved = 0usize;
        let mut first_error: Option<StoreError> = None;

        for resposta in &respostas {
            let resolution = match self.resolver.resolve_or_create(resposta, turno_id, None).await
            {
                Ok(resolution) => resolution,
                Err(e) => {
                    tracing::error!(
                        "Failed to resolve pendencia for resposta {}, skipping: {:?}",
                        resposta.id(),
                        e
                    );
                    first_error.get_or_insert(e);
                    continue;
                }
            };

            match self.link_resolved(resposta, &resolution, &photo, &context).await {
                Ok(Some(linked)) => links.push(linked),
                Ok(None) => unresolved += 1,
                Err(e) => {
                    tracing::error!(
                        "Failed to link photo {} to resposta {}, stopping after {} links: {:?}",
                        mobile_photo_id,
                        resposta.id(),
                        links.len(),
                        e
                    );
                    first_error.get_or_insert(e);
                    break;
                }
            }
        }

        if !links.is_empty() {
            return Ok(ReconciliationOutcome::Linked(links));
        }
        if unresolved > 0 {
            return Ok(ReconciliationOutcome::SkippedRaceUnresolved);
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(ReconciliationOutcome::SkippedNoMatch(
                SkipReason::RespostaNotFound,
            )),
        }
    }

    async fn try_process_with_mapping(
        &self,
        mobile_photo_id: i32,
        turno_id: i32,
        checklist_preenchido_id: i32,
        pergunta_id: i32,
        opcao_resposta_id: i32,
    ) -> StoreResult<ReconciliationOutcome> {
        if self.store.find_turno(turno_id).await?.is_none() {
            tracing::error!("Turno {} not found for photo {}", turno_id, mobile_photo_id);
            return Ok(ReconciliationOutcome::SkippedNoMatch(SkipReason::TurnoNotFound));
        }

        let Some(checklist) = self
            .store
            .find_checklist_by_id(checklist_preenchido_id, turno_id)
            .await?
        else {
            tracing::warn!(
                "Checklist {} not found in turno {} for photo {}",
                checklist_preenchido_id,
                turno_id,
                mobile_photo_id
            );
            return Ok(ReconciliationOutcome::SkippedNoMatch(
                SkipReason::ChecklistNotFound,
            ));
        };

        let Some(resposta) = self
            .store
            .find_respostas(checklist.id, pergunta_id, Some(opcao_resposta_id))
            .await?
            .into_iter()
            .next()
        else {
            tracing::warn!(
                "No resposta for pergunta {} / opcao {} in checklist {} (photo {})",
                pergunta_id,
                opcao_resposta_id,
                checklist_preenchido_id,
                mobile_photo_id
            );
            return Ok(ReconciliationOutcome::SkippedNoMatch(
                SkipReason::RespostaNotFound,
            ));
        };

        let Some(pendencia) = resposta.pendencia.clone() else {
            tracing::warn!(
                "Resposta {} has no pendencia, photo {} not linked",
                resposta.id(),
                mobile_photo_id
            );
            return Ok(ReconciliationOutcome::SkippedNoMatch(
                SkipReason::PendenciaNotFound,
            ));
        };

        let Some(photo) = self.store.find_mobile_photo(mobile_photo_id).await? else {
            tracing::error!("Mobile photo {} not found", mobile_photo_id);
            return Ok(ReconciliationOutcome::SkippedNoMatch(SkipReason::PhotoNotFound));
        };

        let context = LinkContext {
            turno_id,
            pergunta_id,
            correlation: LinkCorrelation::LegacyMapping {
                checklist_preenchido_id,
                opcao_resposta_id,
            },
        };

        let resolution = PendencyResolution::Existing(pendencia);
        match self.link_resolved(&resposta, &resolution, &photo, &context).await? {
            Some(linked) => Ok(ReconciliationOutcome::Linked(vec![linked])),
            None => Ok(ReconciliationOutcome::SkippedRaceUnresolved),
        }
    }

    /// Link the photo when the resolution produced a pendency
    async fn link_resolved(
        &self,
        resposta: &RespostaComPendencia,
        resolution: &PendencyResolution,
        photo: &MobilePhoto,
        context: &LinkContext,
    ) -> StoreResult<Option<LinkedPhoto>> {
        let Some(pendencia) = resolution.pendencia() else {
            tracing::error!(
                "Skipping resposta {} for photo {}: pendencia could not be resolved",
                resposta.id(),
                photo.id
            );
            return Ok(None);
        };

        let foto = self
            .linker
            .link(resposta.id(), pendencia.id, photo, context)
            .await?;

        Ok(Some(LinkedPhoto {
            checklist_resposta_id: resposta.id(),
            checklist_pendencia_id: pendencia.id,
            checklist_resposta_foto_id: foto.id,
            pendencia_created: resolution.was_created(),
        }))
    }
}

/// Log an unexpected store failure and turn it into an outcome
fn absorb_failure(
    strategy: &str,
    mobile_photo_id: i32,
    result: StoreResult<ReconciliationOutcome>,
) -> ReconciliationOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(
                "Unexpected error reconciling photo {} ({}): {:?}",
                mobile_photo_id,
                strategy,
                e
            );
            ReconciliationOutcome::Failed(e.to_string())
        }
    }
}
