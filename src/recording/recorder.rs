use crate::error::ClientError;
use crate::media::{EncodingFormat, LiveCaptureStream};
use async_trait::async_trait;
use std::io::Cursor;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::warn;

/// One finished recording: the assembled binary payload tagged with the
/// container type negotiated at startup.
#[derive(Debug, Clone)]
pub struct RecordingArtifact {
    pub data: Vec<u8>,
    pub format: EncodingFormat,
}

/// The host's recording subsystem.
///
/// `start` begins delivering opaque encoded chunks over the returned
/// channel at encoder-determined intervals; `stop` requests the final
/// chunk flush and resolves once delivery has finished (the channel is
/// closed by then). `assemble` wraps the ordered chunk sequence into one
/// artifact.
#[async_trait]
pub trait Recorder: Send {
    async fn start(&mut self) -> Result<mpsc::UnboundedReceiver<Vec<u8>>, ClientError>;

    async fn stop(&mut self) -> Result<(), ClientError>;

    fn assemble(&self, chunks: Vec<Vec<u8>>) -> Result<RecordingArtifact, ClientError>;
}

/// Creates the recorder for the negotiated format
pub struct RecorderFactory;

impl RecorderFactory {
    pub fn create(
        format: EncodingFormat,
        stream: LiveCaptureStream,
        chunk_interval: Duration,
    ) -> Result<Box<dyn Recorder>, ClientError> {
        match format {
            EncodingFormat::Wav => Ok(Box::new(WavRecorder::new(stream, chunk_interval))),
            _ => Err(ClientError::FormatUnsupported),
        }
    }
}

/// Records PCM from the live capture stream and assembles WAV artifacts.
///
/// Chunks are raw PCM16-LE runs cut at the configured interval; the WAV
/// container is written around them at assembly time.
pub struct WavRecorder {
    stream: LiveCaptureStream,
    chunk_interval: Duration,
    stop_tx: Option<oneshot::Sender<()>>,
    pump: Option<JoinHandle<Result<(), String>>>,
}

impl WavRecorder {
    pub fn new(stream: LiveCaptureStream, chunk_interval: Duration) -> Self {
        Self {
            stream,
            chunk_interval,
            stop_tx: None,
            pump: None,
        }
    }
}

#[async_trait]
impl Recorder for WavRecorder {
    async fn start(&mut self) -> Result<mpsc::UnboundedReceiver<Vec<u8>>, ClientError> {
        if self.pump.is_some() {
            return Err(ClientError::StateConflict("recorder already started"));
        }

        let mut frames = self.stream.subscribe();
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let interval = self.chunk_interval;

        let pump = tokio::spawn(async move {
            let mut pending: Vec<i16> = Vec::new();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        if !pending.is_empty() {
                            let _ = chunk_tx.send(pcm_bytes(&pending));
                        }
                        return Ok(());
                    }
                    _ = ticker.tick() => {
                        if !pending.is_empty() {
                            let run = std::mem::take(&mut pending);
                            let _ = chunk_tx.send(pcm_bytes(&run));
                        }
                    }
                    frame = frames.recv() => match frame {
                        Ok(frame) => pending.extend_from_slice(&frame.samples),
                        Err(RecvError::Lagged(n)) => {
                            warn!("capture stream lagged, {n} frames dropped");
                        }
                        Err(RecvError::Closed) => {
                            return Err("capture stream closed mid-recording".to_string());
                        }
                    }
                }
            }
        });

        self.stop_tx = Some(stop_tx);
        self.pump = Some(pump);

        Ok(chunk_rx)
    }

    async fn stop(&mut self) -> Result<(), ClientError> {
        let Some(pump) = self.pump.take() else {
            return Err(ClientError::StateConflict("recorder not started"));
        };

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        match pump.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(fault)) => Err(ClientError::RecordingFault(fault)),
            Err(e) => Err(ClientError::RecordingFault(e.to_string())),
        }
    }

    fn assemble(&self, chunks: Vec<Vec<u8>>) -> Result<RecordingArtifact, ClientError> {
        let config = self.stream.audio_config();
        let spec = hound::WavSpec {
            channels: config.channels,
            sample_rate: config.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buffer, spec)
                .map_err(|e| ClientError::RecordingFault(e.to_string()))?;

            for chunk in &chunks {
                for pair in chunk.chunks_exact(2) {
                    let sample = i16::from_le_bytes([pair[0], pair[1]]);
                    writer
                        .write_sample(sample)
                        .map_err(|e| ClientError::RecordingFault(e.to_string()))?;
                }
            }

            writer
                .finalize()
                .map_err(|e| ClientError::RecordingFault(e.to_string()))?;
        }

        Ok(RecordingArtifact {
            data: buffer.into_inner(),
            format: EncodingFormat::Wav,
        })
    }
}

fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
