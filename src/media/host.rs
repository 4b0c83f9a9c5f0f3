use crate::error::ClientError;
use crate::media::capability::MediaConstraints;
use crate::media::snapshot::SharedVideoSource;
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tracing::{error, info};

/// Captured audio samples (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Stream parameters reported by the capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    AudioInput,
    VideoInput,
}

/// One enumerated input device
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub kind: DeviceKind,
    pub label: String,
}

/// Platform media subsystem seam.
///
/// The production implementation is [`NativeMediaHost`]; tests substitute
/// a stub that scripts device lists and acquisition outcomes.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// List connected input devices
    async fn enumerate_devices(&self) -> anyhow::Result<Vec<DeviceInfo>>;

    /// Platform identifier used for host classification
    fn platform(&self) -> &str;

    /// Open a live capture stream under the given constraints
    async fn acquire(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<LiveCaptureStream, ClientError>;
}

/// An open capture source, acquired once per client lifetime.
///
/// Recording sessions subscribe per recording; the underlying device is
/// never re-acquired or released mid-session. Capture stops when the last
/// handle drops.
#[derive(Clone)]
pub struct LiveCaptureStream {
    frames: broadcast::Sender<AudioFrame>,
    config: CaptureConfig,
    video: Option<SharedVideoSource>,
    _capture: Option<Arc<CaptureGuard>>,
}

impl std::fmt::Debug for LiveCaptureStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveCaptureStream")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LiveCaptureStream {
    /// Create a stream plus the producer side of its frame channel.
    /// Used by hosts (and test fakes) that feed frames themselves.
    pub fn channel(
        config: CaptureConfig,
        video: Option<SharedVideoSource>,
    ) -> (Self, broadcast::Sender<AudioFrame>) {
        let (frames, _) = broadcast::channel(256);
        let stream = Self {
            frames: frames.clone(),
            config,
            video,
            _capture: None,
        };
        (stream, frames)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AudioFrame> {
        self.frames.subscribe()
    }

    pub fn audio_config(&self) -> CaptureConfig {
        self.config
    }

    pub fn video(&self) -> Option<SharedVideoSource> {
        self.video.clone()
    }

    fn with_guard(mut self, guard: CaptureGuard) -> Self {
        self._capture = Some(Arc::new(guard));
        self
    }
}

/// Stops the capture thread when the last stream handle drops
struct CaptureGuard {
    shutdown: Arc<AtomicBool>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

/// cpal-backed media host
pub struct NativeMediaHost {
    preferred: CaptureConfig,
}

impl NativeMediaHost {
    /// `preferred` is honored when the device supports it; otherwise
    /// capture falls back to the device default config.
    pub fn new(preferred: CaptureConfig) -> Self {
        Self { preferred }
    }

    fn open_video(&self, constraints: &MediaConstraints) -> Option<SharedVideoSource> {
        let video = constraints.video?;

        #[cfg(feature = "camera")]
        {
            use crate::media::snapshot::CameraVideoSource;
            use std::sync::Mutex;

            match CameraVideoSource::open() {
                Ok(camera) => {
                    info!(facing = ?video.facing, "camera opened for snapshots");
                    return Some(Arc::new(Mutex::new(camera)));
                }
                Err(e) => {
                    tracing::warn!("failed to open camera: {e}; snapshots disabled");
                    return None;
                }
            }
        }

        #[cfg(not(feature = "camera"))]
        {
            let _ = video;
            None
        }
    }
}

impl Default for NativeMediaHost {
    fn default() -> Self {
        Self::new(CaptureConfig {
            sample_rate: 16000,
            channels: 1,
        })
    }
}

#[async_trait]
impl MediaHost for NativeMediaHost {
    async fn enumerate_devices(&self) -> anyhow::Result<Vec<DeviceInfo>> {
        let host = cpal::default_host();
        let mut devices = Vec::new();

        for device in host.input_devices()? {
            devices.push(DeviceInfo {
                kind: DeviceKind::AudioInput,
                label: device.name().unwrap_or_else(|_| "unknown".to_string()),
            });
        }

        #[cfg(feature = "camera")]
        match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
            Ok(cameras) => {
                for camera in cameras {
                    devices.push(DeviceInfo {
                        kind: DeviceKind::VideoInput,
                        label: camera.human_name(),
                    });
                }
            }
            Err(e) => tracing::warn!("camera enumeration failed: {e}"),
        }

        Ok(devices)
    }

    fn platform(&self) -> &str {
        std::env::consts::OS
    }

    async fn acquire(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<LiveCaptureStream, ClientError> {
        if !constraints.audio {
            return Err(ClientError::DeviceUnavailable(
                "audio capture not requested".to_string(),
            ));
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let (frame_tx, _) = broadcast::channel::<AudioFrame>(256);
        let (init_tx, init_rx) = oneshot::channel();

        let thread_frames = frame_tx.clone();
        let thread_shutdown = Arc::clone(&shutdown);
        let preferred = self.preferred;
        std::thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || run_capture(thread_frames, init_tx, thread_shutdown, preferred))
            .map_err(|e| ClientError::DeviceUnavailable(e.to_string()))?;

        let config = init_rx.await.map_err(|_| {
            ClientError::DeviceUnavailable("capture thread exited during startup".to_string())
        })??;

        info!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            "live capture stream acquired"
        );

        let video = self.open_video(constraints);

        Ok(LiveCaptureStream {
            frames: frame_tx,
            config,
            video,
            _capture: None,
        }
        .with_guard(CaptureGuard { shutdown }))
    }
}

/// Owns the cpal stream for its whole lifetime (cpal streams are not
/// `Send`, so they must live on one dedicated thread).
fn run_capture(
    frames: broadcast::Sender<AudioFrame>,
    init: oneshot::Sender<Result<CaptureConfig, ClientError>>,
    shutdown: Arc<AtomicBool>,
    preferred: CaptureConfig,
) {
    let host = cpal::default_host();

    let Some(device) = host.default_input_device() else {
        let _ = init.send(Err(ClientError::DeviceUnavailable(
            "no default input device".to_string(),
        )));
        return;
    };

    let input_config = match select_input_config(&device, preferred) {
        Ok(c) => c,
        Err(e) => {
            let _ = init.send(Err(classify_access_error(&e.to_string())));
            return;
        }
    };

    let stream_config: cpal::StreamConfig = input_config.clone().into();
    let config = CaptureConfig {
        sample_rate: stream_config.sample_rate.0,
        channels: stream_config.channels,
    };

    let built = match input_config.sample_format() {
        SampleFormat::F32 => {
            let frames = frames.clone();
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _| publish_f32(data, config, &frames),
                |err| error!("input stream error: {err}"),
                None,
            )
        }
        SampleFormat::I16 => {
            let frames = frames.clone();
            device.build_input_stream(
                &stream_config,
                move |data: &[i16], _| publish_i16(data, config, &frames),
                |err| error!("input stream error: {err}"),
                None,
            )
        }
        SampleFormat::U16 => {
            let frames = frames.clone();
            device.build_input_stream(
                &stream_config,
                move |data: &[u16], _| publish_u16(data, config, &frames),
                |err| error!("input stream error: {err}"),
                None,
            )
        }
        other => {
            let _ = init.send(Err(ClientError::DeviceUnavailable(format!(
                "unsupported input sample format {other:?}"
            ))));
            return;
        }
    };

    let stream = match built {
        Ok(s) => s,
        Err(e) => {
            let _ = init.send(Err(classify_access_error(&e.to_string())));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = init.send(Err(classify_access_error(&e.to_string())));
        return;
    }

    let _ = init.send(Ok(config));

    while !shutdown.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    drop(stream);
    info!("capture thread stopped");
}

fn publish_f32(input: &[f32], config: CaptureConfig, frames: &broadcast::Sender<AudioFrame>) {
    let samples = input
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect();
    let _ = frames.send(AudioFrame {
        samples,
        sample_rate: config.sample_rate,
        channels: config.channels,
    });
}

fn publish_i16(input: &[i16], config: CaptureConfig, frames: &broadcast::Sender<AudioFrame>) {
    let _ = frames.send(AudioFrame {
        samples: input.to_vec(),
        sample_rate: config.sample_rate,
        channels: config.channels,
    });
}

fn publish_u16(input: &[u16], config: CaptureConfig, frames: &broadcast::Sender<AudioFrame>) {
    let samples = input
        .iter()
        .map(|s| (*s as i32 - 32768) as i16)
        .collect();
    let _ = frames.send(AudioFrame {
        samples,
        sample_rate: config.sample_rate,
        channels: config.channels,
    });
}

/// Use the preferred rate/channels when some supported range covers
/// them; otherwise fall back to the device default config.
fn select_input_config(
    device: &cpal::Device,
    preferred: CaptureConfig,
) -> Result<cpal::SupportedStreamConfig, cpal::DefaultStreamConfigError> {
    if let Ok(ranges) = device.supported_input_configs() {
        for range in ranges {
            if range_covers(
                preferred,
                range.channels(),
                range.min_sample_rate().0,
                range.max_sample_rate().0,
            ) {
                return Ok(range.with_sample_rate(SampleRate(preferred.sample_rate)));
            }
        }
    }
    device.default_input_config()
}

fn range_covers(preferred: CaptureConfig, channels: u16, min_rate: u32, max_rate: u32) -> bool {
    channels == preferred.channels && (min_rate..=max_rate).contains(&preferred.sample_rate)
}

/// Distinguish a user permission refusal from any other acquisition
/// failure, based on the backend's error message.
fn classify_access_error(message: &str) -> ClientError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not allowed") {
        ClientError::PermissionDenied(message.to_string())
    } else {
        ClientError::DeviceUnavailable(message.to_string())
    }
}
