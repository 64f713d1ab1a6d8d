pub mod analytics;
pub mod handlers;
pub mod routes;

pub use handlers::{AppState, DataResponse, ErrorResponse};
pub use routes::create_router;
