mod reconciliation_handler;

pub use reconciliation_handler::*;
