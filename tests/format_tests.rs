// Format selection tests with a stubbed capability check.

use converse_client::media::{select_format, EncodingFormat, FormatProbe, NativeFormatProbe};

struct StubProbe(Vec<EncodingFormat>);

impl FormatProbe for StubProbe {
    fn is_supported(&self, format: EncodingFormat) -> bool {
        self.0.contains(&format)
    }
}

#[test]
fn first_supported_candidate_wins() {
    let probe = StubProbe(vec![EncodingFormat::Mp4, EncodingFormat::OpusOgg]);

    let selected = select_format(&probe, &EncodingFormat::DEFAULT_CANDIDATES);

    assert_eq!(selected, Some(EncodingFormat::OpusOgg));
}

#[test]
fn most_preferred_format_wins_when_everything_is_supported() {
    let probe = StubProbe(EncodingFormat::DEFAULT_CANDIDATES.to_vec());

    let selected = select_format(&probe, &EncodingFormat::DEFAULT_CANDIDATES);

    assert_eq!(selected, Some(EncodingFormat::OpusWebm));
}

#[test]
fn no_supported_format_yields_none() {
    let probe = StubProbe(vec![]);

    assert_eq!(select_format(&probe, &EncodingFormat::DEFAULT_CANDIDATES), None);
}

#[test]
fn candidate_list_keeps_the_mandated_relative_order() {
    let pos = |f: EncodingFormat| {
        EncodingFormat::DEFAULT_CANDIDATES
            .iter()
            .position(|&c| c == f)
            .unwrap()
    };

    assert!(pos(EncodingFormat::OpusWebm) < pos(EncodingFormat::OpusOgg));
    assert!(pos(EncodingFormat::OpusOgg) < pos(EncodingFormat::Mp4));
}

#[test]
fn native_probe_supports_wav_only() {
    let probe = NativeFormatProbe;

    assert!(probe.is_supported(EncodingFormat::Wav));
    assert!(!probe.is_supported(EncodingFormat::OpusWebm));
    assert_eq!(
        select_format(&probe, &EncodingFormat::DEFAULT_CANDIDATES),
        Some(EncodingFormat::Wav)
    );
}

#[test]
fn format_tags_match_their_container() {
    assert_eq!(EncodingFormat::OpusWebm.container(), "audio/webm");
    assert_eq!(EncodingFormat::OpusWebm.mime(), "audio/webm;codecs=opus");
    assert_eq!(EncodingFormat::Wav.extension(), "wav");
}
