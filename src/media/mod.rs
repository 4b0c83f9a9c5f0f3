pub mod capability;
pub mod format;
pub mod host;
pub mod snapshot;

pub use capability::{
    classify_host, negotiate, CameraFacing, DeviceCapabilitySet, HostClass, MediaConstraints,
    VideoConstraints,
};
pub use format::{select_format, EncodingFormat, FormatProbe, NativeFormatProbe};
pub use host::{
    AudioFrame, CaptureConfig, DeviceInfo, DeviceKind, LiveCaptureStream, MediaHost,
    NativeMediaHost,
};
pub use snapshot::{capture_snapshot, SharedVideoSource, Snapshot, VideoFrame, VideoSource};
