use serde::{Deserialize, Deserializer, Serialize};

/// Body of a synthesis request
#[derive(Debug, Default, Deserialize)]
pub struct SynthesisRequest {
    /// Text to speak; a missing or `null` field reads as empty
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of one synthesis call
///
/// Serialized without a tag, so callers see either the audio fields or a
/// lone `error` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SynthesisResult {
    Success {
        /// Base64 (standard, padded) encoding of a mono 16-bit PCM WAV file
        audio: String,
        sample_rate: u32,
        /// Seconds of audio
        duration: f64,
    },
    Error {
        error: String,
    },
}

impl SynthesisResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { error: message.into() }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
