#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use reqwest::Client;
use reqwest::multipart;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use uuid::Uuid;

use formbridge::config::{BridgeConfig, Config};
use formbridge::upload::parser::{self, UploadPart};
use formbridge::{ChannelNotifier, Document, Form, FormBridge, Notification};

/// A running upload server with its own staging directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub upload_dir: PathBuf,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Upload one file as the `file` part plus any extra text fields.
    pub async fn upload(
        &self,
        file_name: &str,
        contents: &[u8],
        fields: &[(&str, &str)],
    ) -> (Value, StatusCode) {
        let mut form = multipart::Form::new();
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }
        form = form.part(
            "file",
            multipart::Part::bytes(contents.to_vec()).file_name(file_name.to_string()),
        );
        self.post_multipart(form).await
    }

    /// Send one file to the preprocess endpoint.
    pub async fn preprocess(&self, file_name: &str, contents: &[u8]) -> (Value, StatusCode) {
        let form = multipart::Form::new().part(
            "file",
            multipart::Part::bytes(contents.to_vec()).file_name(file_name.to_string()),
        );
        self.post_multipart_to("/api/preprocess", form).await
    }

    pub async fn post_multipart(&self, form: multipart::Form) -> (Value, StatusCode) {
        self.post_multipart_to("/api/upload", form).await
    }

    pub async fn post_multipart_to(&self, path: &str, form: multipart::Form) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("upload request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Files left behind in the staging directory.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.upload_dir)
            .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default()
    }
}

pub fn test_config(upload_dir: PathBuf) -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        upload_dir,
        allowed_extensions: vec!["csv".to_string(), "xls".to_string(), "xlsx".to_string()],
        max_body_size: 64 * 1024,
        log_level: "warn".to_string(),
    }
}

/// Spawn the upload server with a fresh staging directory.
pub async fn spawn_app() -> TestApp {
    let upload_dir = std::env::temp_dir().join(format!("formbridge_test_{}", Uuid::now_v7().simple()));
    let app = formbridge::build_app(test_config(upload_dir.clone()));
    let addr = serve(app).await;

    TestApp {
        addr,
        client: Client::new(),
        upload_dir,
    }
}

pub async fn cleanup(app: TestApp) {
    let _ = tokio::fs::remove_dir_all(&app.upload_dir).await;
}

/// Bind a router to a random local port and serve it in the background.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    addr
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// What a mock endpoint answers with.
#[derive(Clone)]
pub enum Reply {
    Json(StatusCode, Value),
    Text(StatusCode, &'static str),
}

#[derive(Clone)]
struct MockState {
    reply: Reply,
    delay: Duration,
    seen: Arc<Mutex<Vec<Vec<UploadPart>>>>,
}

/// A mock upload endpoint recording every multipart body it receives.
pub struct MockEndpoint {
    pub addr: SocketAddr,
    pub seen: Arc<Mutex<Vec<Vec<UploadPart>>>>,
}

impl MockEndpoint {
    pub fn url(&self) -> String {
        format!("http://{}/api/upload", self.addr)
    }

    pub async fn requests(&self) -> Vec<Vec<UploadPart>> {
        self.seen.lock().await.clone()
    }
}

pub async fn spawn_mock(reply: Reply) -> MockEndpoint {
    spawn_slow_mock(reply, Duration::ZERO).await
}

/// Like `spawn_mock`, but each request is held for `delay` before answering.
pub async fn spawn_slow_mock(reply: Reply, delay: Duration) -> MockEndpoint {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        reply,
        delay,
        seen: seen.clone(),
    };
    let router = Router::new()
        .route("/api/upload", post(record))
        .with_state(state);
    let addr = serve(router).await;

    MockEndpoint { addr, seen }
}

async fn record(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    let parts = parser::parse_multipart(&headers, body).await.unwrap_or_default();
    state.seen.lock().await.push(parts);

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    match state.reply {
        Reply::Json(status, body) => (status, Json(body)).into_response(),
        Reply::Text(status, body) => (status, body).into_response(),
    }
}

/// A document with one form and a bridge attached to it, reporting into a channel.
pub struct Harness {
    pub form: Arc<Form>,
    pub bridge: FormBridge,
    pub notifications: tokio::sync::mpsc::Receiver<Notification>,
}

pub fn attach(form_id: &str, endpoint: String, single_flight: bool) -> Harness {
    let mut document = Document::new();
    let form = document.insert(Form::new(form_id));

    let config = BridgeConfig {
        endpoint,
        timeout: Duration::from_secs(5),
        single_flight,
    };
    let (notifier, notifications) = ChannelNotifier::new(16);
    let bridge = FormBridge::attach(&document, form_id, &config, Arc::new(notifier))
        .expect("form should be attachable");

    Harness {
        form,
        bridge,
        notifications,
    }
}

pub fn part<'a>(parts: &'a [UploadPart], name: &str) -> Option<&'a UploadPart> {
    parts.iter().find(|p| p.name == name)
}
