pub mod filename;
pub mod inspect;
pub mod parser;
pub mod treatment;

use std::path::PathBuf;

use serde_json::{Value, json};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::state::SharedState;

use parser::UploadPart;

pub const FILE_FIELD: &str = "file";

pub struct UploadResult {
    pub filename: String,
    pub data: Value,
}

/// A validated `file` part, read back from the staging directory.
struct Staged<'a> {
    part: &'a UploadPart,
    safe_name: String,
    extension: String,
    bytes: Vec<u8>,
}

/// Validate the `file` part, store it under the upload directory, summarise
/// it and remove it again. Other text parts are echoed back as `fields`.
pub async fn process(state: &SharedState, parts: Vec<UploadPart>) -> Result<UploadResult, AppError> {
    let staged = stage(&state.config, &parts).await?;
    let summary = inspect::inspect(&staged.bytes, &staged.extension)?;

    // Pairs rather than an object so repeated names survive.
    let fields: Vec<[String; 2]> = parts
        .iter()
        .filter(|p| !p.is_file())
        .map(|p| [p.name.clone(), p.text()])
        .collect();

    tracing::info!(
        "The file: {} has been uploaded and processed successfully!",
        staged.safe_name
    );

    Ok(UploadResult {
        data: json!({
            "filename": staged.safe_name,
            "size": summary.size,
            "content_type": staged.part.content_type,
            "columns": summary.columns,
            "rows": summary.rows,
            "fields": fields,
            "uploaded_at": chrono::Utc::now(),
        }),
        filename: staged.safe_name,
    })
}

/// Same intake as [`process`], then clean the CSV table: drop rows with
/// missing values and duplicate rows, and return a preview of the result.
pub async fn preprocess(state: &SharedState, parts: Vec<UploadPart>) -> Result<UploadResult, AppError> {
    let staged = stage(&state.config, &parts).await?;
    if staged.extension != "csv" {
        tracing::warn!("Preprocessing requested for non-CSV file {}", staged.safe_name);
        return Err(AppError::BadRequest(
            "Only CSV files can be preprocessed".to_string(),
        ));
    }

    let table = inspect::read_csv(&staged.bytes).map_err(|e| {
        if e == inspect::NO_DATA {
            AppError::BadRequest(format!("No data found in the uploaded file: {}", staged.safe_name))
        } else {
            AppError::BadRequest(e)
        }
    })?;
    let report = treatment::clean(table).map_err(AppError::BadRequest)?;

    tracing::info!(
        "Data preprocessing for the file: {} was completed successfully.",
        staged.safe_name
    );

    Ok(UploadResult {
        data: json!({
            "filename": staged.safe_name,
            "columns": report.columns,
            "rows_before": report.rows_before,
            "rows_after": report.rows_after,
            "missing_rows_removed": report.missing_rows_removed,
            "duplicates_removed": report.duplicates_removed,
            "preview": report.preview,
        }),
        filename: staged.safe_name,
    })
}

async fn stage<'a>(config: &Config, parts: &'a [UploadPart]) -> Result<Staged<'a>, AppError> {
    let Some(part) = parts.iter().find(|p| p.name == FILE_FIELD) else {
        tracing::warn!("No file part in the request!");
        return Err(AppError::BadRequest("No file part in the request!".to_string()));
    };

    let original = part.file_name.as_deref().unwrap_or("");
    if original.is_empty() {
        tracing::warn!("No file selected!");
        return Err(AppError::BadRequest("No file selected!".to_string()));
    }

    if !filename::allowed_file(original, &config.allowed_extensions) {
        tracing::warn!("Invalid file format: {original}");
        return Err(AppError::BadRequest("Invalid file format".to_string()));
    }

    let safe_name = filename::secure_filename(original);
    let Some(extension) = filename::extension(&safe_name)
        .filter(|ext| config.allowed_extensions.contains(ext))
    else {
        tracing::warn!("File name '{original}' is empty once sanitised");
        return Err(AppError::BadRequest("No file selected!".to_string()));
    };

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    // Prefix keeps concurrent uploads of the same name apart.
    let path: PathBuf = config
        .upload_dir
        .join(format!("{}_{safe_name}", Uuid::now_v7().simple()));
    tokio::fs::write(&path, &part.data).await?;

    let bytes = tokio::fs::read(&path).await;

    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::error!("Failed to remove temporary upload {}: {e}", path.display());
    }

    Ok(Staged {
        part,
        safe_name,
        extension,
        bytes: bytes?,
    })
}
