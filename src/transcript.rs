use crate::client::TurnOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    User,
    Assistant,
}

/// One transcript line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only view of alternating user/assistant messages.
///
/// Mutated only by a fully successful turn or a fully successful reset;
/// otherwise strictly growing in turn-completion order.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the user transcription and the assistant answer, in that
    /// order.
    pub fn apply_turn(&mut self, outcome: &TurnOutcome) {
        self.append(Speaker::User, outcome.transcription.clone());
        self.append(Speaker::Assistant, outcome.answer.clone());
    }

    pub fn append(&mut self, speaker: Speaker, text: String) {
        self.entries.push(TranscriptEntry {
            speaker,
            text,
            timestamp: Utc::now(),
        });
    }

    /// Clear all entries (conversation reset only)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
