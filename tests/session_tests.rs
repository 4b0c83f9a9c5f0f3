// Recording session state machine tests with a scripted recorder.

use async_trait::async_trait;
use converse_client::error::ClientError;
use converse_client::media::{AudioFrame, CaptureConfig, EncodingFormat, LiveCaptureStream};
use converse_client::recording::{
    Recorder, RecorderSession, RecordingArtifact, SessionState, WavRecorder,
};
use std::time::Duration;
use tokio::sync::mpsc;

/// Replays a scripted chunk sequence on every start; stop closes the
/// channel (and optionally reports a fault), assemble concatenates.
struct FakeRecorder {
    scripted: Vec<Vec<u8>>,
    fail_stop: bool,
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

impl FakeRecorder {
    fn new(scripted: Vec<Vec<u8>>) -> Self {
        Self {
            scripted,
            fail_stop: false,
            tx: None,
        }
    }
}

#[async_trait]
impl Recorder for FakeRecorder {
    async fn start(&mut self) -> Result<mpsc::UnboundedReceiver<Vec<u8>>, ClientError> {
        let (tx, rx) = mpsc::unbounded_channel();
        for chunk in &self.scripted {
            let _ = tx.send(chunk.clone());
        }
        self.tx = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), ClientError> {
        self.tx = None;
        if self.fail_stop {
            return Err(ClientError::RecordingFault("device disconnected".to_string()));
        }
        Ok(())
    }

    fn assemble(&self, chunks: Vec<Vec<u8>>) -> Result<RecordingArtifact, ClientError> {
        Ok(RecordingArtifact {
            data: chunks.concat(),
            format: EncodingFormat::Wav,
        })
    }
}

fn ready_session(chunks: Vec<Vec<u8>>) -> RecorderSession {
    let mut session = RecorderSession::new();
    session.ready(Box::new(FakeRecorder::new(chunks)));
    session
}

#[tokio::test]
async fn start_before_initialization_is_a_state_conflict() {
    let mut session = RecorderSession::new();
    assert_eq!(session.state(), SessionState::Uninitialized);

    let err = session.start().await.unwrap_err();
    assert!(matches!(err, ClientError::StateConflict(_)));
    assert_eq!(session.state(), SessionState::Uninitialized);
}

#[tokio::test]
async fn chunks_are_assembled_in_arrival_order() {
    let mut session = ready_session(vec![b"ab".to_vec(), b"cd".to_vec(), b"ef".to_vec()]);

    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::Recording);

    let artifact = session.stop().await.unwrap();
    assert_eq!(artifact.data, b"abcdef");
    assert_eq!(artifact.format, EncodingFormat::Wav);
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn zero_size_chunks_are_skipped() {
    let mut session = ready_session(vec![b"ab".to_vec(), Vec::new(), b"cd".to_vec()]);

    session.start().await.unwrap();
    let artifact = session.stop().await.unwrap();

    assert_eq!(artifact.data, b"abcd");
}

#[tokio::test]
async fn stop_while_not_recording_never_mutates_the_buffer() {
    let mut session = ready_session(vec![b"ab".to_vec()]);

    let err = session.stop().await.unwrap_err();

    assert!(matches!(err, ClientError::StateConflict(_)));
    assert_eq!(session.buffered_chunks(), 0);
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test]
async fn redundant_start_leaves_the_active_recording_untouched() {
    let mut session = ready_session(vec![b"ab".to_vec()]);

    session.start().await.unwrap();
    let err = session.start().await.unwrap_err();

    assert!(matches!(err, ClientError::StateConflict(_)));
    assert_eq!(session.state(), SessionState::Recording);

    // The one active recording still completes normally.
    let artifact = session.stop().await.unwrap();
    assert_eq!(artifact.data, b"ab");
}

#[tokio::test]
async fn every_recording_starts_from_an_empty_buffer() {
    let mut session = ready_session(vec![b"xy".to_vec()]);

    session.start().await.unwrap();
    let first = session.stop().await.unwrap();
    session.start().await.unwrap();
    let second = session.stop().await.unwrap();

    // No carry-over between recordings.
    assert_eq!(first.data, b"xy");
    assert_eq!(second.data, b"xy");
}

#[tokio::test]
async fn recording_fault_forces_idle() {
    let mut recorder = FakeRecorder::new(vec![b"ab".to_vec()]);
    recorder.fail_stop = true;
    let mut session = RecorderSession::new();
    session.ready(Box::new(recorder));

    session.start().await.unwrap();
    let err = session.stop().await.unwrap_err();

    assert!(matches!(err, ClientError::RecordingFault(_)));
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn empty_capture_never_produces_an_artifact() {
    let mut session = ready_session(vec![]);

    session.start().await.unwrap();
    let err = session.stop().await.unwrap_err();

    assert!(matches!(err, ClientError::RecordingFault(_)));
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn wav_recorder_wraps_pcm_in_a_wav_container() {
    let (stream, frames) = LiveCaptureStream::channel(
        CaptureConfig {
            sample_rate: 16000,
            channels: 1,
        },
        None,
    );

    let mut session = RecorderSession::new();
    session.ready(Box::new(WavRecorder::new(stream, Duration::from_millis(10))));

    session.start().await.unwrap();
    frames
        .send(AudioFrame {
            samples: vec![100, -200, 300],
            sample_rate: 16000,
            channels: 1,
        })
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let artifact = session.stop().await.unwrap();

    // 44-byte canonical header plus three 16-bit samples.
    assert_eq!(&artifact.data[..4], b"RIFF");
    assert_eq!(&artifact.data[8..12], b"WAVE");
    assert_eq!(artifact.data.len(), 44 + 3 * 2);
    assert_eq!(artifact.format, EncodingFormat::Wav);
}
