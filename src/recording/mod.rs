pub mod recorder;
pub mod session;

pub use recorder::{Recorder, RecorderFactory, RecordingArtifact, WavRecorder};
pub use session::{RecorderSession, SessionState};
