use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Acknowledgment returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerOutcome {
    pub message: String,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Which side of the exchange a non-success status blames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    /// 4xx: the user can fix the submission.
    Client,
    /// 5xx: transient, worth trying again later.
    Server,
    /// Anything else that is not 2xx.
    Unexpected,
}

impl ErrorClass {
    pub fn from_status(status: u16) -> Self {
        match status {
            400..=499 => ErrorClass::Client,
            500..=599 => ErrorClass::Server,
            _ => ErrorClass::Unexpected,
        }
    }
}

#[derive(Debug)]
pub enum SubmitError {
    Transport(String),
    MalformedResponse(String),
    Server {
        status: u16,
        class: ErrorClass,
        message: String,
    },
    InvalidPayload(String),
    NotUserInitiated,
    Busy,
    UnknownForm(String),
}

/// Coarse failure category handed to notifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    MalformedResponse,
    ClientError,
    ServerError,
    InvalidPayload,
    NotUserInitiated,
    UnknownForm,
    Busy,
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Transport(msg) => write!(f, "Transport failure: {msg}"),
            SubmitError::MalformedResponse(msg) => write!(f, "Malformed response: {msg}"),
            SubmitError::Server {
                status, message, ..
            } => write!(f, "Server returned {status}: {message}"),
            SubmitError::InvalidPayload(msg) => write!(f, "Invalid payload: {msg}"),
            SubmitError::NotUserInitiated => write!(f, "Submit event was not user initiated"),
            SubmitError::Busy => write!(f, "A submission is already in flight"),
            SubmitError::UnknownForm(id) => write!(f, "No form with id '{id}'"),
        }
    }
}

impl std::error::Error for SubmitError {}

impl SubmitError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SubmitError::Transport(_) => FailureKind::Transport,
            SubmitError::MalformedResponse(_) => FailureKind::MalformedResponse,
            SubmitError::Server {
                class: ErrorClass::Client,
                ..
            } => FailureKind::ClientError,
            SubmitError::Server { .. } => FailureKind::ServerError,
            SubmitError::InvalidPayload(_) => FailureKind::InvalidPayload,
            SubmitError::NotUserInitiated => FailureKind::NotUserInitiated,
            SubmitError::UnknownForm(_) => FailureKind::UnknownForm,
            SubmitError::Busy => FailureKind::Busy,
        }
    }

    /// Text suitable for showing to the person who submitted the form.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Transport(_) => {
                "Could not reach the upload service. Check your connection and try again."
                    .to_string()
            }
            SubmitError::MalformedResponse(_) => {
                "The upload service returned an unexpected response.".to_string()
            }
            SubmitError::Server {
                class: ErrorClass::Client,
                message,
                ..
            } => message.clone(),
            SubmitError::Server { .. } => {
                "The upload service is temporarily unavailable. Please try again later."
                    .to_string()
            }
            SubmitError::InvalidPayload(msg) => msg.clone(),
            SubmitError::NotUserInitiated => "Submission ignored.".to_string(),
            SubmitError::Busy => "An upload is already in progress.".to_string(),
            SubmitError::UnknownForm(id) => format!("Form '{id}' is not available."),
        }
    }
}

/// Turn a status code and response body into an outcome.
///
/// 2xx bodies must be JSON objects with a string `message`; the other fields
/// are taken when they have the expected type and ignored otherwise. Error
/// bodies are searched for `message` or `error` so the user sees what the
/// server said.
pub fn interpret(status: u16, body: &[u8]) -> Result<ServerOutcome, SubmitError> {
    if (200..300).contains(&status) {
        return parse_success(body);
    }

    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|key| v.get(key).and_then(|m| m.as_str()).map(|s| s.to_string()))
        })
        .unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown status")
                .to_string()
        });

    Err(SubmitError::Server {
        status,
        class: ErrorClass::from_status(status),
        message,
    })
}

fn parse_success(body: &[u8]) -> Result<ServerOutcome, SubmitError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| SubmitError::MalformedResponse(e.to_string()))?;

    let message = match value.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(other) => {
            return Err(SubmitError::MalformedResponse(format!(
                "`message` is not a string: {other}"
            )));
        }
        None => {
            return Err(SubmitError::MalformedResponse(
                "response has no `message` field".to_string(),
            ));
        }
    };

    Ok(ServerOutcome {
        message,
        success: value.get("success").and_then(Value::as_bool),
        status_code: value
            .get("status_code")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok()),
        data: value.get("data").filter(|d| !d.is_null()).cloned(),
    })
}
