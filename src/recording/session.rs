use crate::error::ClientError;
use crate::recording::recorder::{Recorder, RecordingArtifact};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Recording session lifecycle.
///
/// `Uninitialized → Ready → Recording → Idle`, with Idle looping back to
/// Recording on the next start. At most one session is ever in the
/// `Recording` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Recording,
    Idle,
}

/// State machine wrapping the host recorder.
///
/// Created once and reused across turns: the chunk buffer is cleared at
/// the start of every recording and the underlying capture stream is
/// never released mid-session.
pub struct RecorderSession {
    state: SessionState,
    recorder: Option<Box<dyn Recorder>>,
    chunks: Vec<Vec<u8>>,
    chunk_rx: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl RecorderSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
            recorder: None,
            chunks: Vec::new(),
            chunk_rx: None,
        }
    }

    /// Attach the recorder negotiated at startup, moving the session to
    /// `Ready`.
    pub fn ready(&mut self, recorder: Box<dyn Recorder>) {
        self.recorder = Some(recorder);
        self.state = SessionState::Ready;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of chunks currently buffered
    pub fn buffered_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Begin a recording.
    ///
    /// Guarded by "not already Recording": a redundant start is a benign
    /// `StateConflict` that leaves the active recording untouched.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        match self.state {
            SessionState::Recording => {
                warn!("start requested while already recording");
                Err(ClientError::StateConflict("recording already in progress"))
            }
            SessionState::Uninitialized => {
                Err(ClientError::StateConflict("recording session not initialized"))
            }
            SessionState::Ready | SessionState::Idle => {
                let Some(recorder) = self.recorder.as_mut() else {
                    return Err(ClientError::StateConflict("recording session not initialized"));
                };

                self.chunks.clear();
                match recorder.start().await {
                    Ok(rx) => {
                        self.chunk_rx = Some(rx);
                        self.state = SessionState::Recording;
                        info!("recording started");
                        Ok(())
                    }
                    Err(e) => {
                        self.state = SessionState::Idle;
                        Err(e)
                    }
                }
            }
        }
    }

    /// Stop the recording and assemble the buffered chunks into one
    /// artifact.
    ///
    /// Guarded by "currently Recording": a redundant stop is a benign
    /// `StateConflict` that never mutates the chunk buffer. Any recording
    /// fault forces the session to `Idle`.
    pub async fn stop(&mut self) -> Result<RecordingArtifact, ClientError> {
        if self.state != SessionState::Recording {
            warn!("stop requested while not recording");
            return Err(ClientError::StateConflict("no recording in progress"));
        }

        let Some(recorder) = self.recorder.as_mut() else {
            return Err(ClientError::StateConflict("recording session not initialized"));
        };

        // Request the final chunk flush; chunks are folded in below even
        // when the flush reports a fault, but the fault still wins.
        let flush = recorder.stop().await;

        if let Some(mut rx) = self.chunk_rx.take() {
            while let Some(chunk) = rx.recv().await {
                if !chunk.is_empty() {
                    self.chunks.push(chunk);
                }
            }
        }

        self.state = SessionState::Idle;
        flush?;

        if self.chunks.is_empty() {
            return Err(ClientError::RecordingFault(
                "no audio captured".to_string(),
            ));
        }

        let chunks = std::mem::take(&mut self.chunks);
        let artifact = recorder.assemble(chunks)?;
        info!(
            bytes = artifact.data.len(),
            container = artifact.format.container(),
            "recording assembled"
        );

        Ok(artifact)
    }
}

impl Default for RecorderSession {
    fn default() -> Self {
        Self::new()
    }
}
