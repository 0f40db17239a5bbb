use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{ChecklistStore, StoreError, StoreResult};
use crate::features::checklist_photos::models::{
    ChecklistPendencia, ChecklistPreenchido, ChecklistResposta, ChecklistRespostaFoto,
    MobilePhoto, NewChecklistPendencia, NewChecklistRespostaFoto, PendenciaStatus,
    RespostaComPendencia, Turno,
};

const RESPOSTA_COLUMNS: &str = r#"
    r.id, r.checklist_preenchido_id, r.pergunta_id, r.opcao_resposta_id,
    r.aguardando_foto, r.fotos_sincronizadas, r.updated_at, r.updated_by, r.deleted_at
"#;

const PENDENCIA_JOIN_COLUMNS: &str = r#"
    p.id AS p_id, p.checklist_preenchido_id AS p_checklist_preenchido_id,
    p.turno_id AS p_turno_id, p.status AS p_status,
    p.observacao_problema AS p_observacao_problema,
    p.created_at AS p_created_at, p.created_by AS p_created_by
"#;

const PENDENCIA_COLUMNS: &str = r#"
    id, checklist_resposta_id, checklist_preenchido_id, turno_id, status,
    observacao_problema, created_at, created_by
"#;

/// Response row with its pendency flattened in from a LEFT JOIN
#[derive(Debug, FromRow)]
struct RespostaPendenciaRow {
    #[sqlx(flatten)]
    resposta: ChecklistResposta,
    p_id: Option<i32>,
    p_checklist_preenchido_id: Option<i32>,
    p_turno_id: Option<i32>,
    p_status: Option<PendenciaStatus>,
    p_observacao_problema: Option<String>,
    p_created_at: Option<DateTime<Utc>>,
    p_created_by: Option<String>,
}

impl From<RespostaPendenciaRow> for RespostaComPendencia {
    fn from(row: RespostaPendenciaRow) -> Self {
        let pendencia = match (
            row.p_id,
            row.p_checklist_preenchido_id,
            row.p_turno_id,
            row.p_status,
            row.p_created_at,
            row.p_created_by,
        ) {
            (
                Some(id),
                Some(checklist_preenchido_id),
                Some(turno_id),
                Some(status),
                Some(created_at),
                Some(created_by),
            ) => Some(ChecklistPendencia {
                id,
                checklist_resposta_id: row.resposta.id,
                checklist_preenchido_id,
                turno_id,
                status,
                observacao_problema: row.p_observacao_problema,
                created_at,
                created_by,
            }),
            _ => None,
        };

        RespostaComPendencia {
            resposta: row.resposta,
            pendencia,
        }
    }
}

/// PostgreSQL-backed checklist store
#[derive(Clone)]
pub struct PgChecklistStore {
    pool: PgPool,
}

impl PgChecklistStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Log and convert a sqlx error
fn store_error(context: &str, e: sqlx::Error) -> StoreError {
    let err = StoreError::from(e);
    if !matches!(err, StoreError::ConstraintViolation { .. }) {
        tracing::error!("Failed to {}: {:?}", context, err);
    }
    err
}

#[async_trait]
impl ChecklistStore for PgChecklistStore {
    async fn find_turno(&self, turno_id: i32) -> StoreResult<Option<Turno>> {
        sqlx::query_as::<_, Turno>(
            r#"
            SELECT id, data_inicio, data_fim, deleted_at
            FROM turnos
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(turno_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("get turno", e))
    }

    async fn find_mobile_photo(&self, mobile_photo_id: i32) -> StoreResult<Option<MobilePhoto>> {
        sqlx::query_as::<_, MobilePhoto>(
            r#"
            SELECT id, turno_id, tipo, storage_path, url, file_size, mime_type,
                   captured_at, deleted_at
            FROM mobile_photos
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(mobile_photo_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("get mobile photo", e))
    }

    async fn find_checklist_by_uuid(
        &self,
        uuid: Uuid,
        turno_id: i32,
    ) -> StoreResult<Option<ChecklistPreenchido>> {
        sqlx::query_as::<_, ChecklistPreenchido>(
            r#"
            SELECT id, uuid, turno_id, deleted_at
            FROM checklists_preenchidos
            WHERE uuid = $1 AND turno_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(uuid)
        .bind(turno_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("get checklist by uuid", e))
    }

    async fn find_checklist_by_id(
        &self,
        checklist_preenchido_id: i32,
        turno_id: i32,
    ) -> StoreResult<Option<ChecklistPreenchido>> {
        sqlx::query_as::<_, ChecklistPreenchido>(
            r#"
            SELECT id, uuid, turno_id, deleted_at
            FROM checklists_preenchidos
            WHERE id = $1 AND turno_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(checklist_preenchido_id)
        .bind(turno_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("get checklist by id", e))
    }

    async fn find_respostas(
        &self,
        checklist_preenchido_id: i32,
        pergunta_id: i32,
        opcao_resposta_id: Option<i32>,
    ) -> StoreResult<Vec<RespostaComPendencia>> {
        let sql = format!(
            r#"
            SELECT {RESPOSTA_COLUMNS}, {PENDENCIA_JOIN_COLUMNS}
            FROM checklist_respostas r
            LEFT JOIN checklist_pendencias p
                ON p.checklist_resposta_id = r.id AND p.deleted_at IS NULL
            WHERE r.checklist_preenchido_id = $1
              AND r.pergunta_id = $2
              AND ($3::INTEGER IS NULL OR r.opcao_resposta_id = $3)
              AND r.deleted_at IS NULL
            ORDER BY r.id ASC
            "#
        );

        let rows = sqlx::query_as::<_, RespostaPendenciaRow>(&sql)
            .bind(checklist_preenchido_id)
            .bind(pergunta_id)
            .bind(opcao_resposta_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("list checklist respostas", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_respostas_by_turno(
        &self,
        turno_id: i32,
        pergunta_id: i32,
    ) -> StoreResult<Vec<RespostaComPendencia>> {
        let sql = format!(
            r#"
            SELECT {RESPOSTA_COLUMNS}, {PENDENCIA_JOIN_COLUMNS}
            FROM checklist_respostas r
            JOIN checklists_preenchidos c
                ON c.id = r.checklist_preenchido_id AND c.deleted_at IS NULL
            LEFT JOIN checklist_pendencias p
                ON p.checklist_resposta_id = r.id AND p.deleted_at IS NULL
            WHERE c.turno_id = $1
              AND r.pergunta_id = $2
              AND r.deleted_at IS NULL
            ORDER BY r.id ASC
            "#
        );

        let rows = sqlx::query_as::<_, RespostaPendenciaRow>(&sql)
            .bind(turno_id)
            .bind(pergunta_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("list checklist respostas by turno", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_pendencia_by_resposta(
        &self,
        checklist_resposta_id: i32,
    ) -> StoreResult<Option<ChecklistPendencia>> {
        let sql = format!(
            r#"
            SELECT {PENDENCIA_COLUMNS}
            FROM checklist_pendencias
            WHERE checklist_resposta_id = $1 AND deleted_at IS NULL
            "#
        );

        sqlx::query_as::<_, ChecklistPendencia>(&sql)
            .bind(checklist_resposta_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("get pendencia by resposta", e))
    }

    async fn create_pendencia(
        &self,
        data: NewChecklistPendencia,
    ) -> StoreResult<ChecklistPendencia> {
        let sql = format!(
            r#"
            INSERT INTO checklist_pendencias (
                checklist_resposta_id, checklist_preenchido_id, turno_id, status,
                observacao_problema, created_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PENDENCIA_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ChecklistPendencia>(&sql)
            .bind(data.checklist_resposta_id)
            .bind(data.checklist_preenchido_id)
            .bind(data.turno_id)
            .bind(data.status)
            .bind(data.observacao_problema)
            .bind(data.created_at)
            .bind(data.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error("create pendencia", e))
    }

    async fn link_photo(
        &self,
        data: NewChecklistRespostaFoto,
    ) -> StoreResult<ChecklistRespostaFoto> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("begin photo link transaction", e))?;

        let foto = sqlx::query_as::<_, ChecklistRespostaFoto>(
            r#"
            INSERT INTO checklist_resposta_fotos (
                checklist_resposta_id, checklist_pendencia_id, storage_path, url,
                file_size, mime_type, metadados, created_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, checklist_resposta_id, checklist_pendencia_id, storage_path, url,
                      file_size, mime_type, metadados, created_at, created_by
            "#,
        )
        .bind(data.checklist_resposta_id)
        .bind(data.checklist_pendencia_id)
        .bind(&data.storage_path)
        .bind(&data.url)
        .bind(data.file_size)
        .bind(&data.mime_type)
        .bind(&data.metadados)
        .bind(data.created_at)
        .bind(&data.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| store_error("create checklist resposta foto", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE checklist_respostas
            SET fotos_sincronizadas = fotos_sincronizadas + 1,
                aguardando_foto = FALSE,
                updated_at = $2,
                updated_by = $3
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(data.checklist_resposta_id)
        .bind(data.created_at)
        .bind(&data.created_by)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("update checklist resposta counters", e))?;

        // Dropping the transaction rolls the link row back
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        tx.commit()
            .await
            .map_err(|e| store_error("commit photo link transaction", e))?;

        Ok(foto)
    }

    async fn list_awaiting_photo(&self, turno_id: i32) -> StoreResult<Vec<ChecklistResposta>> {
        let sql = format!(
            r#"
            SELECT {RESPOSTA_COLUMNS}
            FROM checklist_respostas r
            JOIN checklists_preenchidos c
                ON c.id = r.checklist_preenchido_id AND c.deleted_at IS NULL
            WHERE c.turno_id = $1
              AND r.aguardando_foto = TRUE
              AND r.deleted_at IS NULL
            ORDER BY r.id ASC
            "#
        );

        sqlx::query_as::<_, ChecklistResposta>(&sql)
            .bind(turno_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("list respostas awaiting photo", e))
    }
}
