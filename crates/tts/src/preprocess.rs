use std::path::Path;

use tokenizers::Tokenizer;

use crate::error::{Result, TtsError};

/// Turns text into model input ids
pub trait Preprocessor: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<i64>>;

    /// Output sample rate published by the preprocessor, if any
    fn sampling_rate(&self) -> Option<u32> {
        None
    }
}

/// `tokenizer.json`-backed preprocessor
pub struct TokenizerPreprocessor {
    tokenizer: Tokenizer,
    sampling_rate: Option<u32>,
}

impl TokenizerPreprocessor {
    pub fn from_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| TtsError::Tokenizer(format!("failed to load {}: {e}", path.display())))?;

        Ok(Self {
            tokenizer,
            sampling_rate: None,
        })
    }

    #[must_use]
    pub const fn with_sampling_rate(mut self, sampling_rate: u32) -> Self {
        self.sampling_rate = Some(sampling_rate);
        self
    }
}

impl Preprocessor for TokenizerPreprocessor {
    fn encode(&self, text: &str) -> Result<Vec<i64>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| TtsError::Tokenizer(e.to_string()))?;

        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        if ids.is_empty() {
            return Err(TtsError::Tokenizer("input produced no tokens".to_string()));
        }

        Ok(ids)
    }

    fn sampling_rate(&self) -> Option<u32> {
        self.sampling_rate
    }
}

/// Read `sampling_rate` from a preprocessor config JSON file
///
/// Processors that wrap a feature extractor keep the rate one level down,
/// under `feature_extractor`.
pub fn read_sampling_rate(path: &Path) -> Result<u32> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| TtsError::ConfigError(format!("failed to read {}: {e}", path.display())))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| TtsError::ConfigError(format!("failed to parse {}: {e}", path.display())))?;

    let rate = value
        .get("sampling_rate")
        .or_else(|| value.pointer("/feature_extractor/sampling_rate"))
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| TtsError::ConfigError(format!("{} does not define sampling_rate", path.display())))?;

    match u32::try_from(rate) {
        Ok(rate) if rate > 0 => Ok(rate),
        _ => Err(TtsError::ConfigError(format!("invalid sampling_rate {rate}"))),
    }
}
