use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde_json::{Value, json};

use crate::error::AppError;
use crate::state::SharedState;
use crate::upload;

use super::upload::read_parts;

pub async fn preprocess(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let parts = read_parts(&headers, body).await?;
    let result = upload::preprocess(&state, parts).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Data preprocessing for the file: {} was completed successfully.",
            result.filename
        ),
        "status_code": StatusCode::OK.as_u16(),
        "data": result.data,
    })))
}
