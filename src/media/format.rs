use tracing::{info, warn};

/// Audio codec/container pairings a recording session can produce,
/// most-preferred first in [`EncodingFormat::DEFAULT_CANDIDATES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingFormat {
    OpusWebm,
    OpusOgg,
    Mp4,
    /// Native fallback the shipped recorder can always produce
    Wav,
}

impl EncodingFormat {
    /// Priority-ordered candidate list checked at startup
    pub const DEFAULT_CANDIDATES: [EncodingFormat; 4] = [
        EncodingFormat::OpusWebm,
        EncodingFormat::OpusOgg,
        EncodingFormat::Mp4,
        EncodingFormat::Wav,
    ];

    /// Full coded type used when probing recorder support
    pub fn mime(&self) -> &'static str {
        match self {
            EncodingFormat::OpusWebm => "audio/webm;codecs=opus",
            EncodingFormat::OpusOgg => "audio/ogg;codecs=opus",
            EncodingFormat::Mp4 => "audio/mp4",
            EncodingFormat::Wav => "audio/wav",
        }
    }

    /// Container type used to tag the assembled recording artifact
    pub fn container(&self) -> &'static str {
        match self {
            EncodingFormat::OpusWebm => "audio/webm",
            EncodingFormat::OpusOgg => "audio/ogg",
            EncodingFormat::Mp4 => "audio/mp4",
            EncodingFormat::Wav => "audio/wav",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::OpusWebm => "webm",
            EncodingFormat::OpusOgg => "ogg",
            EncodingFormat::Mp4 => "mp4",
            EncodingFormat::Wav => "wav",
        }
    }
}

/// Reports which encoding formats the host's recording subsystem supports
pub trait FormatProbe {
    fn is_supported(&self, format: EncodingFormat) -> bool;
}

/// Return the first supported candidate in priority order, or `None` when
/// the host supports none of them.
///
/// `None` is fatal to recording capability: the caller must disable the
/// start/stop controls. The rest of the client remains usable.
pub fn select_format(
    probe: &dyn FormatProbe,
    candidates: &[EncodingFormat],
) -> Option<EncodingFormat> {
    for &candidate in candidates {
        if probe.is_supported(candidate) {
            info!(mime = candidate.mime(), "selected recording format");
            return Some(candidate);
        }
    }
    warn!("no supported recording format among candidates");
    None
}

/// Probe for the recorder implementations this build ships
pub struct NativeFormatProbe;

impl FormatProbe for NativeFormatProbe {
    fn is_supported(&self, format: EncodingFormat) -> bool {
        matches!(format, EncodingFormat::Wav)
    }
}
