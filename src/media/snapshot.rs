use crate::config::SnapshotConfig;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// A single decoded video frame (packed RGB8)
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// A live video frame source.
///
/// The production implementation wraps a camera; tests substitute a fake.
pub trait VideoSource: Send {
    /// Grab the most recent frame, or `None` if no frame is available
    fn grab_frame(&mut self) -> Option<VideoFrame>;
}

/// The single shared video source owned by the capture stream
pub type SharedVideoSource = Arc<Mutex<dyn VideoSource>>;

/// An encoded still image as a Base64 JPEG data URL.
/// Produced freshly per turn; never persisted beyond one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(String);

impl Snapshot {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Sample the current video frame into a JPEG data URL at the fixed
/// configured resolution.
///
/// Synchronous and without retry semantics: any failure here (no frame,
/// zero-dimension surface, encode error) means "no snapshot attached",
/// never a turn failure.
pub fn capture_snapshot(source: &SharedVideoSource, cfg: &SnapshotConfig) -> Option<Snapshot> {
    let frame = {
        let mut guard = source.lock().ok()?;
        guard.grab_frame()?
    };

    if frame.width == 0 || frame.height == 0 || cfg.width == 0 || cfg.height == 0 {
        warn!("zero-dimension snapshot surface; skipping snapshot");
        return None;
    }

    let Some(img) = RgbImage::from_raw(frame.width, frame.height, frame.rgb) else {
        warn!("video frame buffer did not match its dimensions; skipping snapshot");
        return None;
    };

    let resized = imageops::resize(&img, cfg.width, cfg.height, imageops::FilterType::Triangle);

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, cfg.jpeg_quality);
    if let Err(e) = encoder.encode(
        resized.as_raw(),
        cfg.width,
        cfg.height,
        image::ExtendedColorType::Rgb8,
    ) {
        warn!("snapshot JPEG encoding failed: {e}; skipping snapshot");
        return None;
    }

    let b64 = base64::engine::general_purpose::STANDARD.encode(&jpeg);
    Some(Snapshot(format!("data:image/jpeg;base64,{b64}")))
}

/// Camera-backed video source
#[cfg(feature = "camera")]
pub struct CameraVideoSource {
    camera: nokhwa::Camera,
}

#[cfg(feature = "camera")]
impl CameraVideoSource {
    /// Open the first available camera and start its stream
    pub fn open() -> anyhow::Result<Self> {
        use nokhwa::pixel_format::RgbFormat;
        use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};

        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = nokhwa::Camera::new(CameraIndex::Index(0), requested)?;
        camera.open_stream()?;

        Ok(Self { camera })
    }
}

#[cfg(feature = "camera")]
impl VideoSource for CameraVideoSource {
    fn grab_frame(&mut self) -> Option<VideoFrame> {
        use nokhwa::pixel_format::RgbFormat;

        let frame = self.camera.frame().ok()?;
        let decoded = frame.decode_image::<RgbFormat>().ok()?;
        Some(VideoFrame {
            width: decoded.width(),
            height: decoded.height(),
            rgb: decoded.into_raw(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SolidFrameSource {
        width: u32,
        height: u32,
    }

    impl VideoSource for SolidFrameSource {
        fn grab_frame(&mut self) -> Option<VideoFrame> {
            Some(VideoFrame {
                width: self.width,
                height: self.height,
                rgb: vec![128; (self.width * self.height * 3) as usize],
            })
        }
    }

    struct EmptySource;

    impl VideoSource for EmptySource {
        fn grab_frame(&mut self) -> Option<VideoFrame> {
            None
        }
    }

    fn shared(source: impl VideoSource + 'static) -> SharedVideoSource {
        Arc::new(Mutex::new(source))
    }

    #[test]
    fn snapshot_is_a_jpeg_data_url() {
        let source = shared(SolidFrameSource {
            width: 320,
            height: 240,
        });
        let snap = capture_snapshot(&source, &SnapshotConfig::default()).unwrap();
        assert!(snap.as_str().starts_with("data:image/jpeg;base64,"));
        assert!(snap.as_str().len() > "data:image/jpeg;base64,".len());
    }

    #[test]
    fn zero_dimension_frame_yields_no_snapshot() {
        let source = shared(SolidFrameSource {
            width: 0,
            height: 0,
        });
        assert!(capture_snapshot(&source, &SnapshotConfig::default()).is_none());
    }

    #[test]
    fn missing_frame_yields_no_snapshot() {
        let source = shared(EmptySource);
        assert!(capture_snapshot(&source, &SnapshotConfig::default()).is_none());
    }
}
