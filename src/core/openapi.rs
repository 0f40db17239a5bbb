use utoipa::{Modify, OpenApi};

use crate::features::checklist_photos::{
    dtos as checklist_photos_dtos, handlers as checklist_photos_handlers,
    models as checklist_photos_models, services as checklist_photos_services,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Checklist photos
        checklist_photos_handlers::reconcile_photo,
        checklist_photos_handlers::list_awaiting_photos,
    ),
    components(
        schemas(
            Meta,
            checklist_photos_dtos::ReconcilePhotoDto,
            checklist_photos_dtos::OutcomeKindDto,
            checklist_photos_dtos::ReconciliationResultDto,
            checklist_photos_dtos::AwaitingPhotoDto,
            checklist_photos_services::LinkedPhoto,
            checklist_photos_services::SkipReason,
            checklist_photos_models::PendenciaStatus,
            ApiResponse<checklist_photos_dtos::ReconciliationResultDto>,
            ApiResponse<Vec<checklist_photos_dtos::AwaitingPhotoDto>>,
        )
    ),
    tags(
        (name = "checklist-photos", description = "Reconciliation of mobile checklist photos with pendencies"),
    ),
    info(
        title = "Checklist Photo Sync API",
        version = "0.1.0",
        description = "Reconciliation of mobile checklist photos with pendencies",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
