use crate::error::ClientError;
use base64::Engine;
use serde::Deserialize;
use tracing::warn;

/// Wire shape of a `POST /process_input/` response.
///
/// Exactly one of the success fields or the error field is populated by
/// the backend; precedence is resolved by [`TurnResponse::into_outcome`].
#[derive(Debug, Clone, Deserialize)]
pub struct TurnResponse {
    #[serde(default)]
    pub transcription: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub audio_base64: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A fully parsed, successful conversation turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub transcription: String,
    pub answer: String,
    /// Decoded MP3 speech; absent when synthesis was unavailable
    pub speech: Option<Vec<u8>>,
}

impl TurnResponse {
    /// Apply the response precedence rules: an explicit `error` field
    /// wins; then both success fields are required; an undecodable audio
    /// payload degrades to speech-absent rather than failing the turn.
    pub fn into_outcome(self) -> Result<TurnOutcome, ClientError> {
        if let Some(error) = self.error {
            return Err(ClientError::ServerError(error));
        }

        let (Some(transcription), Some(answer)) = (self.transcription, self.answer) else {
            return Err(ClientError::Transport(
                "response missing transcription or answer".to_string(),
            ));
        };

        let speech = match self.audio_base64 {
            Some(b64) => match base64::engine::general_purpose::STANDARD.decode(b64.as_bytes()) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("synthesized audio payload undecodable: {e}");
                    None
                }
            },
            None => None,
        };

        Ok(TurnOutcome {
            transcription,
            answer,
            speech,
        })
    }
}

/// Wire shape of a `POST /reset_conversation/` response
#[derive(Debug, Clone, Deserialize)]
pub struct ResetAck {
    pub success: bool,
}
