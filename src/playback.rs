use crate::error::ClientError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;
use tracing::info;

/// The singleton response-audio output.
///
/// Starting new playback preempts whatever is currently playing. Tests
/// substitute a fake that records play calls.
pub trait SpeechSink {
    /// Decode and begin playing MP3 speech, interrupting current playback
    fn play(&mut self, mp3: Vec<u8>) -> Result<(), ClientError>;

    /// Stop any in-progress playback
    fn stop(&mut self);
}

/// rodio-backed speech output
pub struct RodioSink {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    current: Option<Sink>,
}

impl RodioSink {
    pub fn new() -> Result<Self, ClientError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| ClientError::Playback(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
            current: None,
        })
    }
}

impl SpeechSink for RodioSink {
    fn play(&mut self, mp3: Vec<u8>) -> Result<(), ClientError> {
        self.stop();

        let source =
            Decoder::new(Cursor::new(mp3)).map_err(|e| ClientError::Playback(e.to_string()))?;
        let sink = Sink::try_new(&self.handle).map_err(|e| ClientError::Playback(e.to_string()))?;
        sink.append(source);

        info!("response speech playback started");
        self.current = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.current.take() {
            sink.stop();
        }
    }
}
