use crate::client::ConversationBackend;
use crate::config::SnapshotConfig;
use crate::error::ClientError;
use crate::media::{capture_snapshot, DeviceCapabilitySet, SharedVideoSource, Snapshot};
use crate::playback::SpeechSink;
use crate::recording::{RecorderSession, SessionState};
use crate::transcript::Transcript;
use tracing::{info, warn};

/// Whether response speech actually played for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechStatus {
    Played,
    /// Non-fatal: transcript entries from the turn remain
    Unavailable,
}

/// Result of one completed turn, for rendering
#[derive(Debug, Clone)]
pub struct TurnSummary {
    pub transcription: String,
    pub answer: String,
    pub speech: SpeechStatus,
}

/// Orchestrates the capture-and-converse pipeline for one client.
///
/// Owns the shared singletons — recording session, transcript, speech
/// sink, snapshot source — so ownership stays traceable and each seam can
/// be substituted in tests.
pub struct ConversationClient {
    capabilities: DeviceCapabilitySet,
    session: RecorderSession,
    backend: Box<dyn ConversationBackend>,
    speech: Box<dyn SpeechSink>,
    transcript: Transcript,
    video: Option<SharedVideoSource>,
    snapshot_config: SnapshotConfig,
    attach_snapshot: bool,
}

impl ConversationClient {
    pub fn new(
        capabilities: DeviceCapabilitySet,
        session: RecorderSession,
        backend: Box<dyn ConversationBackend>,
        speech: Box<dyn SpeechSink>,
        video: Option<SharedVideoSource>,
        snapshot_config: SnapshotConfig,
    ) -> Self {
        Self {
            capabilities,
            session,
            backend,
            speech,
            transcript: Transcript::new(),
            video,
            snapshot_config,
            attach_snapshot: false,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn capabilities(&self) -> DeviceCapabilitySet {
        self.capabilities
    }

    /// Toggle snapshot attachment. Ignored (returns false) when the host
    /// has no video input.
    pub fn set_attach_snapshot(&mut self, on: bool) -> bool {
        if on && !self.capabilities.has_video_input {
            warn!("snapshot attachment unavailable without a video input");
            self.attach_snapshot = false;
            return false;
        }
        self.attach_snapshot = on;
        true
    }

    pub fn attach_snapshot(&self) -> bool {
        self.attach_snapshot
    }

    /// Begin recording the next utterance
    pub async fn start_recording(&mut self) -> Result<(), ClientError> {
        self.session.start().await
    }

    /// Stop recording, send the turn, and apply the response.
    ///
    /// The transcript is mutated only on a fully successful turn; any
    /// failure before that leaves it untouched and the user simply
    /// re-records. Missing speech is reported, never fatal.
    pub async fn finish_turn(&mut self) -> Result<TurnSummary, ClientError> {
        let artifact = self.session.stop().await?;
        let snapshot = self.turn_snapshot();

        let outcome = self.backend.send_turn(&artifact, snapshot.as_ref()).await?;
        self.transcript.apply_turn(&outcome);

        let speech = match outcome.speech {
            Some(bytes) => match self.speech.play(bytes) {
                Ok(()) => SpeechStatus::Played,
                Err(e) => {
                    warn!("speech playback failed: {e}");
                    SpeechStatus::Unavailable
                }
            },
            None => {
                warn!("no synthesized speech in response");
                SpeechStatus::Unavailable
            }
        };

        Ok(TurnSummary {
            transcription: outcome.transcription,
            answer: outcome.answer,
            speech,
        })
    }

    fn turn_snapshot(&self) -> Option<Snapshot> {
        if !self.attach_snapshot || !self.capabilities.has_video_input {
            return None;
        }
        let source = self.video.as_ref()?;
        capture_snapshot(source, &self.snapshot_config)
    }

    /// Reset the server-side conversation and clear the local transcript.
    ///
    /// Requires explicit confirmation. A negative acknowledgment or a
    /// transport failure leaves the transcript untouched. Never affects
    /// recording state.
    pub async fn reset(&mut self, confirmed: bool) -> Result<bool, ClientError> {
        if !confirmed {
            info!("reset not confirmed; conversation left untouched");
            return Ok(false);
        }

        if self.backend.reset().await? {
            self.transcript.clear();
            info!("conversation reset; transcript cleared");
            Ok(true)
        } else {
            Err(ClientError::ResetFailure(
                "backend declined the reset".to_string(),
            ))
        }
    }
}
