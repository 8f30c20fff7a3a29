use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use crate::config::BridgeConfig;
use crate::form::{Document, Form, SubmitEvent};
use crate::notify::{Notification, Notifier};
use crate::outcome::{self, ServerOutcome, SubmitError};
use crate::payload::SubmissionPayload;

pub type SubmitResult = Result<ServerOutcome, SubmitError>;

/// Turns submit events on one form into multipart uploads and reports the outcome.
///
/// Every handled event has its default action prevented. The form is read at
/// the moment the event is handled; the request itself runs asynchronously, so
/// a second event can be handled while the first is still in flight.
#[derive(Clone)]
pub struct FormBridge {
    client: reqwest::Client,
    endpoint: String,
    form: Arc<Form>,
    notifier: Arc<dyn Notifier>,
    in_flight: Option<Arc<AtomicBool>>,
}

impl FormBridge {
    /// Attach to the form with `form_id` in `document`.
    pub fn attach(
        document: &Document,
        form_id: &str,
        config: &BridgeConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, SubmitError> {
        let form = document
            .form(form_id)
            .ok_or_else(|| SubmitError::UnknownForm(form_id.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SubmitError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, config, form, notifier))
    }

    pub fn with_client(
        client: reqwest::Client,
        config: &BridgeConfig,
        form: Arc<Form>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            form,
            notifier,
            in_flight: config
                .single_flight
                .then(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn form_id(&self) -> &str {
        self.form.id()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Handle an event and wait for the outcome.
    pub async fn submit(&self, event: &mut SubmitEvent) -> SubmitResult {
        self.start(event)?.await
    }

    /// Handle an event and run the upload in the background.
    ///
    /// Returns before any network activity; the snapshot has already been
    /// taken when this returns.
    pub fn dispatch(&self, event: &mut SubmitEvent) -> Result<JoinHandle<SubmitResult>, SubmitError> {
        Ok(tokio::spawn(self.start(event)?))
    }

    /// Handle every event arriving on `events` until the sender side closes,
    /// then wait for outstanding uploads. Events aimed at other forms are skipped.
    pub async fn listen(&self, mut events: mpsc::Receiver<SubmitEvent>) -> Vec<SubmitResult> {
        let mut uploads = JoinSet::new();
        let mut results = Vec::new();

        while let Some(mut event) = events.recv().await {
            if event.target() != self.form.id() {
                continue;
            }
            match self.start(&mut event) {
                Ok(upload) => {
                    uploads.spawn(upload);
                }
                Err(e) => results.push(Err(e)),
            }
        }

        while let Some(joined) = uploads.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::error!("Upload task for form {} failed: {e}", self.form.id()),
            }
        }

        results
    }

    /// Synchronous part of event handling: suppress the default action, check
    /// the event, capture the payload. The returned future does the network work.
    fn start(
        &self,
        event: &mut SubmitEvent,
    ) -> Result<impl Future<Output = SubmitResult> + Send + use<>, SubmitError> {
        let started = match self.begin(event) {
            Ok(started) => Ok(started),
            Err(SubmitError::Busy) => Err(SubmitError::Busy),
            Err(e) => return Err(e),
        };

        let bridge = self.clone();
        Ok(async move {
            let result = match started {
                Ok((payload, guard)) => {
                    let result = bridge.deliver(payload).await;
                    drop(guard);
                    result
                }
                Err(e) => Err(e),
            };
            bridge.report(&result).await;
            result
        })
    }

    fn begin(
        &self,
        event: &mut SubmitEvent,
    ) -> Result<(SubmissionPayload, Option<FlightGuard>), SubmitError> {
        if event.target() != self.form.id() {
            return Err(SubmitError::UnknownForm(event.target().to_string()));
        }

        event.prevent_default();

        if !event.is_trusted() {
            tracing::debug!("Ignoring synthetic submit event on form {}", self.form.id());
            return Err(SubmitError::NotUserInitiated);
        }

        let guard = match &self.in_flight {
            Some(flag) => Some(FlightGuard::acquire(flag).ok_or(SubmitError::Busy)?),
            None => None,
        };

        Ok((self.form.snapshot(), guard))
    }

    async fn deliver(&self, payload: SubmissionPayload) -> SubmitResult {
        let fields = payload.len();
        let body = payload.into_multipart()?;

        tracing::debug!(
            form = self.form.id(),
            fields,
            "Posting submission to {}",
            self.endpoint
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(body)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| SubmitError::Transport(format!("Failed to read response: {e}")))?;

        outcome::interpret(status, &body)
    }

    async fn report(&self, result: &SubmitResult) {
        let notification = match result {
            Ok(outcome) => Notification::Message(outcome.message.clone()),
            Err(e) => {
                tracing::warn!(form = self.form.id(), "{e}");
                Notification::Failure {
                    kind: e.kind(),
                    message: e.user_message(),
                }
            }
        };
        self.notifier.notify(notification).await;
    }
}

/// Holds the single-flight slot until the upload finishes.
struct FlightGuard(Arc<AtomicBool>);

impl FlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard(flag.clone()))
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
