pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use routes::routes;
pub use services::PhotoReconciliationService;
pub use store::PgChecklistStore;
