use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde_json::{Value, json};

use crate::error::AppError;
use crate::state::SharedState;
use crate::upload;
use crate::upload::parser::{self, UploadPart};

pub async fn upload(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let parts = read_parts(&headers, body).await?;
    let result = upload::process(&state, parts).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("The file: {} has been uploaded successfully!", result.filename),
        "status_code": StatusCode::OK.as_u16(),
        "data": result.data,
    })))
}

pub(super) async fn read_parts(headers: &HeaderMap, body: Bytes) -> Result<Vec<UploadPart>, AppError> {
    if !parser::is_multipart(headers) {
        tracing::warn!("Upload request is not multipart/form-data");
        return Err(AppError::BadRequest("Invalid upload request!".to_string()));
    }

    parser::parse_multipart(headers, body)
        .await
        .map_err(AppError::BadRequest)
}
