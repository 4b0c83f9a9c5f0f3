use crate::error::ClientError;
use crate::media::host::{DeviceKind, LiveCaptureStream, MediaHost};
use tracing::{info, warn};

/// Host classification derived from the platform identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostClass {
    Mobile,
    Desktop,
}

/// Preferred camera orientation when video capture is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    /// Front-facing camera (toward the user)
    User,
    /// Rear-facing camera (toward the environment)
    Environment,
}

/// What the host offers, derived once from device enumeration.
/// Immutable for the client lifetime; re-derivation requires a fresh
/// negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilitySet {
    pub has_audio_input: bool,
    pub has_video_input: bool,
    pub host_class: HostClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    pub facing: CameraFacing,
}

/// Constraint set handed to the host when acquiring the capture stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: Option<VideoConstraints>,
}

/// Platform identifiers that classify a host as mobile
const MOBILE_PLATFORMS: &[&str] = &["android", "ios", "iphone", "ipad", "ipod"];

/// Classify the host by matching the platform identifier against the
/// known mobile-pattern set.
pub fn classify_host(platform: &str) -> HostClass {
    let platform = platform.to_ascii_lowercase();
    if MOBILE_PLATFORMS.iter().any(|p| platform.contains(p)) {
        HostClass::Mobile
    } else {
        HostClass::Desktop
    }
}

impl MediaConstraints {
    /// Build constraints deterministically from the capability set:
    /// video is never requested without a video input device, and the
    /// facing preference follows the host class.
    pub fn from_capabilities(caps: &DeviceCapabilitySet) -> Self {
        let video = if caps.has_video_input {
            Some(VideoConstraints {
                facing: match caps.host_class {
                    HostClass::Mobile => CameraFacing::Environment,
                    HostClass::Desktop => CameraFacing::User,
                },
            })
        } else {
            None
        };

        Self {
            audio: caps.has_audio_input,
            video,
        }
    }
}

/// Discover available input devices, classify the host, and acquire a
/// live capture stream under the derived constraints.
///
/// A missing video input is not a failure: the caller disables the
/// snapshot affordance and continues audio-only. A missing audio input
/// is fatal to the whole pipeline.
pub async fn negotiate(
    host: &dyn MediaHost,
) -> Result<(DeviceCapabilitySet, LiveCaptureStream), ClientError> {
    let devices = host
        .enumerate_devices()
        .await
        .map_err(|e| ClientError::DeviceUnavailable(e.to_string()))?;

    let caps = DeviceCapabilitySet {
        has_audio_input: devices.iter().any(|d| d.kind == DeviceKind::AudioInput),
        has_video_input: devices.iter().any(|d| d.kind == DeviceKind::VideoInput),
        host_class: classify_host(host.platform()),
    };

    if !caps.has_audio_input {
        return Err(ClientError::DeviceUnavailable(
            "no audio input device found".to_string(),
        ));
    }

    if !caps.has_video_input {
        warn!("no video input device; continuing in audio-only mode");
    }

    let constraints = MediaConstraints::from_capabilities(&caps);
    info!(?caps, ?constraints, "negotiated media capabilities");

    let stream = host.acquire(&constraints).await?;

    Ok((caps, stream))
}
