use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::ChecklistPendencia;

/// One answer to one question of a filled checklist
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChecklistResposta {
    pub id: i32,
    pub checklist_preenchido_id: i32,
    pub pergunta_id: i32,
    pub opcao_resposta_id: i32,
    pub aguardando_foto: bool,
    pub fotos_sincronizadas: i32,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A response loaded together with its pendency, if one exists
#[derive(Debug, Clone)]
pub struct RespostaComPendencia {
    pub resposta: ChecklistResposta,
    pub pendencia: Option<ChecklistPendencia>,
}

impl RespostaComPendencia {
    pub fn id(&self) -> i32 {
        self.resposta.id
    }
}
