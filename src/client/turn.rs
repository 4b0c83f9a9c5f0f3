use crate::client::protocol::{ResetAck, TurnOutcome, TurnResponse};
use crate::error::ClientError;
use crate::media::Snapshot;
use crate::recording::RecordingArtifact;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

/// Anti-forgery header attached to every state-changing request
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Multipart field carrying the recording artifact
const AUDIO_FIELD: &str = "audio";
/// Multipart field carrying the optional snapshot data URL
const IMAGE_FIELD: &str = "image";

/// The remote conversational backend, seen from the client.
///
/// The production implementation is [`TurnClient`]; tests substitute a
/// scripted fake.
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    /// Send one conversation turn and await its structured result
    async fn send_turn(
        &self,
        artifact: &RecordingArtifact,
        snapshot: Option<&Snapshot>,
    ) -> Result<TurnOutcome, ClientError>;

    /// Ask the backend to reset the conversation; `true` acknowledges
    async fn reset(&self) -> Result<bool, ClientError>;
}

/// reqwest-backed turn protocol client.
///
/// Carries the anti-forgery token read once at startup, a request
/// timeout, and an in-flight guard so at most one turn is outstanding.
pub struct TurnClient {
    http: reqwest::Client,
    base: Url,
    csrf_token: String,
    in_flight: AtomicBool,
}

impl TurnClient {
    pub fn new(
        base_url: &str,
        csrf_token: String,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)
            .map_err(|e| ClientError::Transport(format!("invalid base url: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base,
            csrf_token,
            in_flight: AtomicBool::new(false),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}

/// Releases the in-flight flag when the turn resolves, success or not
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ClientError> {
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ClientError::StateConflict("a turn is already in flight"));
        }
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConversationBackend for TurnClient {
    async fn send_turn(
        &self,
        artifact: &RecordingArtifact,
        snapshot: Option<&Snapshot>,
    ) -> Result<TurnOutcome, ClientError> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let part = Part::bytes(artifact.data.clone())
            .file_name(format!("audio.{}", artifact.format.extension()))
            .mime_str(artifact.format.container())
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let mut form = Form::new().part(AUDIO_FIELD, part);
        if let Some(snapshot) = snapshot {
            form = form.text(IMAGE_FIELD, snapshot.as_str().to_string());
        }

        let url = self.endpoint("process_input/")?;
        info!(bytes = artifact.data.len(), with_snapshot = snapshot.is_some(), "sending turn");

        let response = self
            .http
            .post(url)
            .header(CSRF_HEADER, &self.csrf_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        // The backend reports failures through the JSON `error` field,
        // so the body is parsed regardless of the HTTP status.
        let parsed: TurnResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        parsed.into_outcome()
    }

    async fn reset(&self) -> Result<bool, ClientError> {
        let url = self.endpoint("reset_conversation/")?;

        let response = self
            .http
            .post(url)
            .header(CSRF_HEADER, &self.csrf_token)
            .send()
            .await
            .map_err(|e| ClientError::ResetFailure(e.to_string()))?;

        let ack: ResetAck = response
            .json()
            .await
            .map_err(|e| ClientError::ResetFailure(e.to_string()))?;

        Ok(ack.success)
    }
}
