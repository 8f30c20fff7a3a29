use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use formbridge::config::{BridgeConfig, DEFAULT_ENDPOINT};
use formbridge::{Document, FieldValue, FileBlob, Form, FormBridge, SubmitEvent, TracingNotifier};

const FORM_ID: &str = "cli-form";

/// Submit a form to an upload endpoint as multipart data.
#[derive(Debug, Parser)]
#[command(name = "formbridge-submit", version)]
struct Args {
    /// Upload endpoint URL.
    #[arg(long, env = "FORMBRIDGE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Text field as NAME=VALUE. Repeatable.
    #[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_pair)]
    fields: Vec<(String, String)>,

    /// File field as NAME=PATH. Repeatable.
    #[arg(long = "file", value_name = "NAME=PATH", value_parser = parse_pair)]
    files: Vec<(String, String)>,

    /// Request timeout in seconds.
    #[arg(long, env = "FORMBRIDGE_TIMEOUT_SECS", default_value_t = 30)]
    timeout: u64,

    #[arg(long, env = "FORMBRIDGE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let form = Form::new(FORM_ID);
    for (name, value) in args.fields {
        form.append(name, FieldValue::Text(value));
    }
    for (name, path) in args.files {
        let path = PathBuf::from(path);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        form.append(name, FieldValue::File(FileBlob::new(file_name, bytes)));
    }

    let mut document = Document::new();
    document.insert(form);

    let config = BridgeConfig {
        endpoint: args.endpoint,
        timeout: Duration::from_secs(args.timeout),
        ..BridgeConfig::from_env()?
    };
    let bridge = FormBridge::attach(&document, FORM_ID, &config, Arc::new(TracingNotifier))?;

    let mut event = SubmitEvent::user(FORM_ID);
    bridge.submit(&mut event).await?;

    Ok(())
}
