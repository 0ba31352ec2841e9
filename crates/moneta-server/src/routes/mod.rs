// Export route modules
pub mod chat;
pub mod ingest;
pub mod status;

use crate::state::AppState;
use axum::Router;

// Function to configure all routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(chat::routes(state.clone()))
        .merge(ingest::routes(state))
        .merge(status::routes())
}
