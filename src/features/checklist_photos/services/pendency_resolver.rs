use chrono::Utc;
use std::sync::Arc;

use crate::features::checklist_photos::models::{
    ChecklistPendencia, NewChecklistPendencia, PendenciaStatus, RespostaComPendencia,
};
use crate::features::checklist_photos::store::{
    ChecklistStore, StoreResult, PENDENCIA_RESPOSTA_COLUMN,
};

/// How a pendency was obtained for a response
#[derive(Debug, Clone)]
pub enum PendencyResolution {
    /// The response already carried a pendency
    Existing(ChecklistPendencia),
    /// This call inserted the pendency
    Created(ChecklistPendencia),
    /// Another writer won the insert race; its row was re-fetched
    Recovered(ChecklistPendencia),
    /// The insert hit the unique index but the re-fetch found nothing
    Unresolved,
}

impl PendencyResolution {
    pub fn pendencia(&self) -> Option<&ChecklistPendencia> {
        match self {
            PendencyResolution::Existing(p)
            | PendencyResolution::Created(p)
            | PendencyResolution::Recovered(p) => Some(p),
            PendencyResolution::Unresolved => None,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, PendencyResolution::Created(_))
    }
}

/// Returns the pendency of a response, creating it at most once.
///
/// Concurrent callers for the same response are serialized by the store's
/// unique index on `checklist_resposta_id`: the loser of the insert race gets
/// a constraint violation and reads back the winner's row. No application
/// level locking is involved.
pub struct PendencyResolver {
    store: Arc<dyn ChecklistStore>,
    actor: String,
}

impl PendencyResolver {
    pub fn new(store: Arc<dyn ChecklistStore>, actor: impl Into<String>) -> Self {
        Self {
            store,
            actor: actor.into(),
        }
    }

    /// Resolve or create the pendency for `resposta`.
    ///
    /// Store failures other than the unique-index race are returned as-is.
    pub async fn resolve_or_create(
        &self,
        resposta: &RespostaComPendencia,
        turno_id: i32,
        observacao_problema: Option<&str>,
    ) -> StoreResult<PendencyResolution> {
        if let Some(existing) = &resposta.pendencia {
            tracing::debug!(
                "Resposta {} already has pendencia {}",
                resposta.id(),
                existing.id
            );
            return Ok(PendencyResolution::Existing(existing.clone()));
        }

        let data = NewChecklistPendencia {
            checklist_resposta_id: resposta.id(),
            checklist_preenchido_id: resposta.resposta.checklist_preenchido_id,
            turno_id,
            status: PendenciaStatus::AguardandoTratamento,
            observacao_problema: observacao_problema.map(str::to_string),
            created_at: Utc::now(),
            created_by: self.actor.clone(),
        };

        match self.store.create_pendencia(data).await {
            Ok(pendencia) => {
                tracing::info!(
                    "Pendencia {} created for resposta {} (turno {})",
                    pendencia.id,
                    resposta.id(),
                    turno_id
                );
                Ok(PendencyResolution::Created(pendencia))
            }
            Err(e) if e.violates(PENDENCIA_RESPOSTA_COLUMN) => {
                tracing::debug!(
                    "Pendencia for resposta {} created concurrently, fetching existing",
                    resposta.id()
                );

                match self.store.find_pendencia_by_resposta(resposta.id()).await? {
                    Some(pendencia) => Ok(PendencyResolution::Recovered(pendencia)),
                    None => {
                        tracing::error!(
                            "Pendencia for resposta {} violated unique index but was not found",
                            resposta.id()
                        );
                        Ok(PendencyResolution::Unresolved)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::checklist_photos::store::StoreError;
    use crate::shared::test_helpers::InMemoryChecklistStore;
    use futures::future::join_all;

    fn resolver(store: &Arc<InMemoryChecklistStore>) -> PendencyResolver {
        PendencyResolver::new(store.clone(), "system")
    }

    #[tokio::test]
    async fn test_creates_pendency_when_missing() {
        let store = Arc::new(InMemoryChecklistStore::new());
        let turno = store.add_turno();
        let checklist = store.add_checklist(turno);
        let resposta_id = store.add_resposta(checklist.id, 3, 1);
        let resposta = store.resposta_com_pendencia(resposta_id);

        let resolution = resolver(&store)
            .resolve_or_create(&resposta, turno, Some("foto de reprovação"))
            .await
            .unwrap();

        assert!(resolution.was_created());
        let pendencia = resolution.pendencia().unwrap();
        assert_eq!(pendencia.status, PendenciaStatus::AguardandoTratamento);
        assert_eq!(pendencia.created_by, "system");
        assert_eq!(pendencia.turno_id, turno);
        assert_eq!(pendencia.checklist_preenchido_id, checklist.id);
        assert_eq!(
            pendencia.observacao_problema.as_deref(),
            Some("foto de reprovação")
        );
        assert_eq!(store.pendencias_for(resposta_id), 1);
    }

    #[tokio::test]
    async fn test_returns_existing_pendency_without_creating() {
        let store = Arc::new(InMemoryChecklistStore::new());
        let turno = store.add_turno();
        let checklist = store.add_checklist(turno);
        let resposta_id = store.add_resposta(checklist.id, 3, 1);
        let existing = store.add_pendencia(resposta_id, turno);
        let resposta = store.resposta_com_pendencia(resposta_id);

        let resolution = resolver(&store)
            .resolve_or_create(&resposta, turno, None)
            .await
            .unwrap();

        assert!(matches!(resolution, PendencyResolution::Existing(_)));
        assert_eq!(resolution.pendencia().unwrap().id, existing);
        assert_eq!(store.pendencias_for(resposta_id), 1);
    }

    #[tokio::test]
    async fn test_concurrent_resolution_yields_single_pendency() {
        let store = Arc::new(InMemoryChecklistStore::new());
        let turno = store.add_turno();
        let checklist = store.add_checklist(turno);
        let resposta_id = store.add_resposta(checklist.id, 3, 1);
        // Every caller works from the same snapshot taken before any pendency existed
        let snapshot = store.resposta_com_pendencia(resposta_id);
        let resolver = resolver(&store);

        let results = join_all(
            (0..8).map(|_| resolver.resolve_or_create(&snapshot, turno, None)),
        )
        .await;

        let resolutions: Vec<PendencyResolution> =
            results.into_iter().map(|r| r.unwrap()).collect();
        let ids: Vec<i32> = resolutions
            .iter()
            .map(|r| r.pendencia().unwrap().id)
            .collect();

        assert_eq!(store.pendencias_for(resposta_id), 1);
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(resolutions.iter().filter(|r| r.was_created()).count(), 1);
        assert_eq!(
            resolutions
                .iter()
                .filter(|r| matches!(r, PendencyResolution::Recovered(_)))
                .count(),
            7
        );
    }

    #[tokio::test]
    async fn test_unresolved_when_refetch_misses() {
        let store = Arc::new(InMemoryChecklistStore::new());
        let turno = store.add_turno();
        let checklist = store.add_checklist(turno);
        let resposta_id = store.add_resposta(checklist.id, 3, 1);
        store.simulate_phantom_conflicts(true);
        let resposta = store.resposta_com_pendencia(resposta_id);

        let resolution = resolver(&store)
            .resolve_or_create(&resposta, turno, None)
            .await
            .unwrap();

        assert!(matches!(resolution, PendencyResolution::Unresolved));
        assert_eq!(store.pendencias_for(resposta_id), 0);
    }

    #[tokio::test]
    async fn test_other_store_errors_propagate() {
        let store = Arc::new(InMemoryChecklistStore::new());
        let turno = store.add_turno();
        let checklist = store.add_checklist(turno);
        let resposta_id = store.add_resposta(checklist.id, 3, 1);
        store.fail_writes(true);
        let resposta = store.resposta_com_pendencia(resposta_id);

        let result = resolver(&store)
            .resolve_or_create(&resposta, turno, None)
            .await;

        assert!(matches!(result, Err(StoreError::Database(_))));
    }
}
