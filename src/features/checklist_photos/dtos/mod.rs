mod reconciliation_dto;

pub use reconciliation_dto::{
    AwaitingPhotoDto, OutcomeKindDto, ReconcilePhotoDto, ReconciliationResultDto,
};
