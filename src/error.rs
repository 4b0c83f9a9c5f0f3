use thiserror::Error;

/// Failure taxonomy for the capture-and-converse pipeline.
///
/// Permanent failures (see [`ClientError::is_permanent`]) disable the
/// affected control for the rest of the client lifetime; everything else
/// is recovered locally and the user may simply retry.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Media access denied: {0}")]
    PermissionDenied(String),

    #[error("Media device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("No supported recording format on this host")]
    FormatUnsupported,

    /// Redundant start/stop or a second turn while one is in flight.
    /// Benign: surfaced as a notice, never mutates pipeline state.
    #[error("{0}")]
    StateConflict(&'static str),

    #[error("Recording fault: {0}")]
    RecordingFault(String),

    #[error("Request failed: {0}")]
    Transport(String),

    /// The backend answered with an explicit `error` field.
    #[error("{0}")]
    ServerError(String),

    #[error("Conversation reset failed: {0}")]
    ResetFailure(String),

    #[error("Speech playback failed: {0}")]
    Playback(String),
}

impl ClientError {
    /// Whether this failure permanently disables its control for the
    /// client lifetime (capability and format failures) as opposed to
    /// being retryable.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ClientError::PermissionDenied(_)
                | ClientError::DeviceUnavailable(_)
                | ClientError::FormatUnsupported
        )
    }
}
