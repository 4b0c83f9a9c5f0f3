pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod media;
pub mod playback;
pub mod recording;
pub mod transcript;

pub use app::{ConversationClient, SpeechStatus, TurnSummary};
pub use client::{ConversationBackend, TurnClient, TurnOutcome, TurnResponse};
pub use config::Config;
pub use error::ClientError;
pub use media::{
    negotiate, select_format, DeviceCapabilitySet, EncodingFormat, LiveCaptureStream, MediaHost,
    NativeFormatProbe, NativeMediaHost, Snapshot,
};
pub use playback::{RodioSink, SpeechSink};
pub use recording::{Recorder, RecorderFactory, RecorderSession, RecordingArtifact, SessionState};
pub use transcript::{Speaker, Transcript, TranscriptEntry};
