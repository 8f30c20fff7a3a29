use askama::Template;
use axum::Router;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;

use crate::error::AppError;
use crate::state::SharedState;

pub const UPLOAD_FORM_ID: &str = "upload-form";

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    form_id: &'static str,
    action: &'static str,
    accept: String,
}

pub fn view_routes() -> Router<SharedState> {
    Router::new().route("/", get(index))
}

async fn index(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let accept = state
        .config
        .allowed_extensions
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");

    let template = IndexTemplate {
        form_id: UPLOAD_FORM_ID,
        action: "/api/upload",
        accept,
    };
    let html = template
        .render()
        .map_err(|e| AppError::Internal(format!("Failed to render index: {e}")))?;
    Ok(Html(html))
}
