use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::checklist_photos::handlers;
use crate::features::checklist_photos::services::PhotoReconciliationService;

/// Create routes for the checklist photo reconciliation feature
pub fn routes(service: Arc<PhotoReconciliationService>) -> Router {
    Router::new()
        .route(
            "/api/mobile/photos/{mobile_photo_id}/reconcile",
            post(handlers::reconcile_photo),
        )
        .route(
            "/api/turnos/{turno_id}/awaiting-photos",
            get(handlers::list_awaiting_photos),
        )
        .with_state(service)
}
