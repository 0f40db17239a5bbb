use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::checklist_photos::dtos::{
    AwaitingPhotoDto, ReconcilePhotoDto, ReconciliationResultDto,
};
use crate::features::checklist_photos::services::PhotoReconciliationService;
use crate::shared::types::{ApiResponse, Meta};

/// Reconcile an uploaded mobile photo with its checklist response
///
/// Called after the upload handler has stored the photo. The strategy is
/// picked from the keys supplied: `checklist_uuid` first, then the legacy
/// `checklist_preenchido_id` + `opcao_resposta_id` pair, otherwise the
/// turno/pergunta fallback. Business misses still answer 200; the outcome
/// field tells what happened.
#[utoipa::path(
    post,
    path = "/api/mobile/photos/{mobile_photo_id}/reconcile",
    tag = "checklist-photos",
    params(
        ("mobile_photo_id" = i32, Path, description = "Id of the stored mobile photo")
    ),
    request_body = ReconcilePhotoDto,
    responses(
        (status = 200, description = "Reconciliation ran", body = ApiResponse<ReconciliationResultDto>),
        (status = 400, description = "Invalid correlation keys")
    )
)]
pub async fn reconcile_photo(
    State(service): State<Arc<PhotoReconciliationService>>,
    Path(mobile_photo_id): Path<i32>,
    AppJson(dto): AppJson<ReconcilePhotoDto>,
) -> Result<Json<ApiResponse<ReconciliationResultDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let correlation = dto.into_correlation(mobile_photo_id);
    tracing::debug!(
        "Reconciling photo {} with strategy {:?}",
        mobile_photo_id,
        correlation.strategy()
    );

    let outcome = service.reconcile(&correlation).await;
    tracing::debug!(
        "Photo {} reconciled (linked={}, links={})",
        mobile_photo_id,
        outcome.is_linked(),
        outcome.links().len()
    );

    Ok(Json(ApiResponse::success(
        Some(ReconciliationResultDto::from(outcome)),
        None,
        None,
    )))
}

/// List responses of a turno still waiting for a photo
#[utoipa::path(
    get,
    path = "/api/turnos/{turno_id}/awaiting-photos",
    tag = "checklist-photos",
    params(
        ("turno_id" = i32, Path, description = "Turno id")
    ),
    responses(
        (status = 200, description = "Responses awaiting a photo", body = ApiResponse<Vec<AwaitingPhotoDto>>),
        (status = 404, description = "Turno not found")
    )
)]
pub async fn list_awaiting_photos(
    State(service): State<Arc<PhotoReconciliationService>>,
    Path(turno_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<AwaitingPhotoDto>>>> {
    let respostas = service.list_awaiting_photo(turno_id).await?;
    let total = respostas.len() as i64;
    let items = respostas.into_iter().map(AwaitingPhotoDto::from).collect();

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}
