//! In-memory [`ChecklistStore`] for unit and handler tests.
//!
//! Enforces the same one-pendency-per-response unique index and soft-delete
//! filtering as the Postgres store. Failure knobs let tests drive the
//! constraint-race and store-outage paths.

use async_trait::async_trait;
use chrono::Utc;
use fake::{Fake, Faker};
use std::sync::Mutex;
use uuid::Uuid;

use crate::features::checklist_photos::models::{
    ChecklistPendencia, ChecklistPreenchido, ChecklistResposta, ChecklistRespostaFoto,
    MobilePhoto, NewChecklistPendencia, NewChecklistRespostaFoto, PendenciaStatus,
    RespostaComPendencia, Turno,
};
use crate::features::checklist_photos::store::{ChecklistStore, StoreError, StoreResult};

const PENDENCIA_UNIQUE_INDEX: &str = "checklist_pendencias_checklist_resposta_id_key";

#[derive(Default)]
struct State {
    next_id: i32,
    turnos: Vec<Turno>,
    checklists: Vec<ChecklistPreenchido>,
    respostas: Vec<ChecklistResposta>,
    photos: Vec<MobilePhoto>,
    pendencias: Vec<ChecklistPendencia>,
    fotos: Vec<ChecklistRespostaFoto>,
    phantom_conflicts: bool,
    fail_writes: bool,
    link_limit: Option<usize>,
    link_calls: usize,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn pendencia_of(&self, resposta_id: i32) -> Option<ChecklistPendencia> {
        self.pendencias
            .iter()
            .find(|p| p.checklist_resposta_id == resposta_id)
            .cloned()
    }

    fn with_pendencia(&self, resposta: &ChecklistResposta) -> RespostaComPendencia {
        RespostaComPendencia {
            resposta: resposta.clone(),
            pendencia: self.pendencia_of(resposta.id),
        }
    }

    fn live_checklist(&self, id: i32) -> Option<&ChecklistPreenchido> {
        self.checklists
            .iter()
            .find(|c| c.id == id && c.deleted_at.is_none())
    }
}

pub struct InMemoryChecklistStore {
    state: Mutex<State>,
}

impl Default for InMemoryChecklistStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChecklistStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_turno(&self) -> i32 {
        let mut state = self.lock();
        let id = state.next_id();
        state.turnos.push(Turno {
            id,
            data_inicio: Utc::now(),
            data_fim: None,
            deleted_at: None,
        });
        id
    }

    pub fn add_checklist(&self, turno_id: i32) -> ChecklistPreenchido {
        self.add_checklist_with_uuid(turno_id, Uuid::new_v4())
    }

    pub fn add_checklist_with_uuid(&self, turno_id: i32, uuid: Uuid) -> ChecklistPreenchido {
        let mut state = self.lock();
        let checklist = ChecklistPreenchido {
            id: state.next_id(),
            uuid,
            turno_id,
            deleted_at: None,
        };
        state.checklists.push(checklist.clone());
        checklist
    }

    /// Add a response flagged as waiting for a photo
    pub fn add_resposta(
        &self,
        checklist_preenchido_id: i32,
        pergunta_id: i32,
        opcao_resposta_id: i32,
    ) -> i32 {
        let mut state = self.lock();
        let id = state.next_id();
        state.respostas.push(ChecklistResposta {
            id,
            checklist_preenchido_id,
            pergunta_id,
            opcao_resposta_id,
            aguardando_foto: true,
            fotos_sincronizadas: 0,
            updated_at: None,
            updated_by: None,
            deleted_at: None,
        });
        id
    }

    pub fn add_photo(&self, turno_id: i32) -> i32 {
        let mut state = self.lock();
        let id = state.next_id();
        let name: String = Faker.fake();
        state.photos.push(MobilePhoto {
            id,
            turno_id,
            tipo: "reprovacao".to_string(),
            storage_path: format!("mobile/photos/{}.jpg", name),
            url: format!("https://storage.local/mobile/photos/{}.jpg", name),
            file_size: (10_000..5_000_000).fake::<i32>(),
            mime_type: "image/jpeg".to_string(),
            captured_at: Some(Utc::now()),
            deleted_at: None,
        });
        id
    }

    pub fn add_pendencia(&self, resposta_id: i32, turno_id: i32) -> i32 {
        let mut state = self.lock();
        let id = state.next_id();
        let checklist_preenchido_id = state
            .respostas
            .iter()
            .find(|r| r.id == resposta_id)
            .map(|r| r.checklist_preenchido_id)
            .unwrap();
        state.pendencias.push(ChecklistPendencia {
            id,
            checklist_resposta_id: resposta_id,
            checklist_preenchido_id,
            turno_id,
            status: PendenciaStatus::AguardandoTratamento,
            observacao_problema: None,
            created_at: Utc::now(),
            created_by: "system".to_string(),
        });
        id
    }

    pub fn delete_resposta(&self, resposta_id: i32) {
        let mut state = self.lock();
        if let Some(r) = state.respostas.iter_mut().find(|r| r.id == resposta_id) {
            r.deleted_at = Some(Utc::now());
        }
    }

    pub fn delete_turno(&self, turno_id: i32) {
        let mut state = self.lock();
        if let Some(t) = state.turnos.iter_mut().find(|t| t.id == turno_id) {
            t.deleted_at = Some(Utc::now());
        }
    }

    /// Make pendency inserts report a unique violation without persisting
    /// anything, so the follow-up lookup misses
    pub fn simulate_phantom_conflicts(&self, enabled: bool) {
        self.lock().phantom_conflicts = enabled;
    }

    /// Make every write fail with a database error
    pub fn fail_writes(&self, enabled: bool) {
        self.lock().fail_writes = enabled;
    }

    /// Let the first `limit` photo links succeed and fail every later one
    /// with a database error
    pub fn fail_links_after(&self, limit: usize) {
        self.lock().link_limit = Some(limit);
    }

    pub fn resposta(&self, resposta_id: i32) -> ChecklistResposta {
        self.lock()
            .respostas
            .iter()
            .find(|r| r.id == resposta_id)
            .cloned()
            .unwrap()
    }

    pub fn resposta_com_pendencia(&self, resposta_id: i32) -> RespostaComPendencia {
        let state = self.lock();
        let resposta = state
            .respostas
            .iter()
            .find(|r| r.id == resposta_id)
            .unwrap();
        state.with_pendencia(resposta)
    }

    pub fn photo(&self, photo_id: i32) -> MobilePhoto {
        self.lock()
            .photos
            .iter()
            .find(|p| p.id == photo_id)
            .cloned()
            .unwrap()
    }

    pub fn pendencias(&self) -> Vec<ChecklistPendencia> {
        self.lock().pendencias.clone()
    }

    pub fn pendencias_for(&self, resposta_id: i32) -> usize {
        self.lock()
            .pendencias
            .iter()
            .filter(|p| p.checklist_resposta_id == resposta_id)
            .count()
    }

    pub fn fotos(&self) -> Vec<ChecklistRespostaFoto> {
        self.lock().fotos.clone()
    }
}

#[async_trait]
impl ChecklistStore for InMemoryChecklistStore {
    async fn find_turno(&self, turno_id: i32) -> StoreResult<Option<Turno>> {
        Ok(self
            .lock()
            .turnos
            .iter()
            .find(|t| t.id == turno_id && t.deleted_at.is_none())
            .cloned())
    }

    async fn find_mobile_photo(&self, mobile_photo_id: i32) -> StoreResult<Option<MobilePhoto>> {
        Ok(self
            .lock()
            .photos
            .iter()
            .find(|p| p.id == mobile_photo_id && p.deleted_at.is_none())
            .cloned())
    }

    async fn find_checklist_by_uuid(
        &self,
        uuid: Uuid,
        turno_id: i32,
    ) -> StoreResult<Option<ChecklistPreenchido>> {
        Ok(self
            .lock()
            .checklists
            .iter()
            .find(|c| c.uuid == uuid && c.turno_id == turno_id && c.deleted_at.is_none())
            .cloned())
    }

    async fn find_checklist_by_id(
        &self,
        checklist_preenchido_id: i32,
        turno_id: i32,
    ) -> StoreResult<Option<ChecklistPreenchido>> {
        Ok(self
            .lock()
            .live_checklist(checklist_preenchido_id)
            .filter(|c| c.turno_id == turno_id)
            .cloned())
    }

    async fn find_respostas(
        &self,
        checklist_preenchido_id: i32,
        pergunta_id: i32,
        opcao_resposta_id: Option<i32>,
    ) -> StoreResult<Vec<RespostaComPendencia>> {
        let state = self.lock();
        Ok(state
            .respostas
            .iter()
            .filter(|r| {
                r.checklist_preenchido_id == checklist_preenchido_id
                    && r.pergunta_id == pergunta_id
                    && opcao_resposta_id.map_or(true, |o| r.opcao_resposta_id == o)
                    && r.deleted_at.is_none()
            })
            .map(|r| state.with_pendencia(r))
            .collect())
    }

    async fn find_respostas_by_turno(
        &self,
        turno_id: i32,
        pergunta_id: i32,
    ) -> StoreResult<Vec<RespostaComPendencia>> {
        let state = self.lock();
        Ok(state
            .respostas
            .iter()
            .filter(|r| {
                r.pergunta_id == pergunta_id
                    && r.deleted_at.is_none()
                    && state
                        .live_checklist(r.checklist_preenchido_id)
                        .is_some_and(|c| c.turno_id == turno_id)
            })
            .map(|r| state.with_pendencia(r))
            .collect())
    }

    async fn find_pendencia_by_resposta(
        &self,
        checklist_resposta_id: i32,
    ) -> StoreResult<Option<ChecklistPendencia>> {
        Ok(self.lock().pendencia_of(checklist_resposta_id))
    }

    async fn create_pendencia(
        &self,
        data: NewChecklistPendencia,
    ) -> StoreResult<ChecklistPendencia> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        if state.phantom_conflicts || state.pendencia_of(data.checklist_resposta_id).is_some() {
            return Err(StoreError::ConstraintViolation {
                constraint: PENDENCIA_UNIQUE_INDEX.to_string(),
            });
        }

        let pendencia = ChecklistPendencia {
            id: state.next_id(),
            checklist_resposta_id: data.checklist_resposta_id,
            checklist_preenchido_id: data.checklist_preenchido_id,
            turno_id: data.turno_id,
            status: data.status,
            observacao_problema: data.observacao_problema,
            created_at: data.created_at,
            created_by: data.created_by,
        };
        state.pendencias.push(pendencia.clone());
        Ok(pendencia)
    }

    async fn link_photo(
        &self,
        data: NewChecklistRespostaFoto,
    ) -> StoreResult<ChecklistRespostaFoto> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        state.link_calls += 1;
        let calls = state.link_calls;
        if state.link_limit.is_some_and(|limit| calls > limit) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        // Check the counter update can apply before writing anything
        let Some(index) = state
            .respostas
            .iter()
            .position(|r| r.id == data.checklist_resposta_id && r.deleted_at.is_none())
        else {
            return Err(StoreError::NotFound);
        };

        let foto = ChecklistRespostaFoto {
            id: state.next_id(),
            checklist_resposta_id: data.checklist_resposta_id,
            checklist_pendencia_id: data.checklist_pendencia_id,
            storage_path: data.storage_path,
            url: data.url,
            file_size: data.file_size,
            mime_type: data.mime_type,
            metadados: data.metadados,
            created_at: data.created_at,
            created_by: data.created_by.clone(),
        };
        state.fotos.push(foto.clone());

        let resposta = &mut state.respostas[index];
        resposta.fotos_sincronizadas += 1;
        resposta.aguardando_foto = false;
        resposta.updated_at = Some(data.created_at);
        resposta.updated_by = Some(data.created_by);

        Ok(foto)
    }

    async fn list_awaiting_photo(&self, turno_id: i32) -> StoreResult<Vec<ChecklistResposta>> {
        let state = self.lock();
        Ok(state
            .respostas
            .iter()
            .filter(|r| {
                r.aguardando_foto
                    && r.deleted_at.is_none()
                    && state
                        .live_checklist(r.checklist_preenchido_id)
                        .is_some_and(|c| c.turno_id == turno_id)
            })
            .cloned()
            .collect())
    }
}
