pub mod preprocess;
pub mod upload;

use axum::Router;
use axum::routing::post;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/upload", post(upload::upload))
        .route("/api/upload/", post(upload::upload))
        .route("/api/preprocess", post(preprocess::preprocess))
        .route("/api/preprocess/", post(preprocess::preprocess))
}
