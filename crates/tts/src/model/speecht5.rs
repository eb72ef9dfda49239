//! SpeechT5 encoder/decoder and HiFi-GAN vocoder
//!
//! The decoder is the merged export with a `use_cache_branch` switch: the
//! first step runs without a cache and every later step feeds back the
//! self-attention cache. Cross-attention entries are computed once on the
//! first step and reused.

use std::{collections::HashMap, path::Path};

use ndarray::{ArrayD, IxDyn};
use serde::Deserialize;

use super::{Spectrogram, SpectrogramModel, Vocoder};
use crate::{
    device::ComputeDevice,
    error::{Result, TtsError},
    onnx::{self, OnnxSession},
    speaker::SpeakerEmbedding,
};

/// Stop probability at which decoding ends
const STOP_THRESHOLD: f32 = 0.5;
/// Upper bound on decoder steps, as a multiple of reduced encoder length
const MAX_LENGTH_RATIO: usize = 20;

/// Architecture fields read from the model's `config.json`
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechT5Config {
    pub decoder_layers: usize,
    pub decoder_attention_heads: usize,
    pub hidden_size: usize,
    pub num_mel_bins: usize,
    pub reduction_factor: usize,
}

impl SpeechT5Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| TtsError::ConfigError(format!("failed to read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| TtsError::ConfigError(format!("failed to parse {}: {e}", path.display())))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.decoder_layers == 0 || self.num_mel_bins == 0 || self.reduction_factor == 0 {
            return Err(TtsError::ConfigError(
                "decoder_layers, num_mel_bins and reduction_factor must be non-zero".to_string(),
            ));
        }
        if self.decoder_attention_heads == 0 || self.hidden_size % self.decoder_attention_heads != 0 {
            return Err(TtsError::ConfigError(format!(
                "hidden_size {} is not divisible by {} attention heads",
                self.hidden_size, self.decoder_attention_heads
            )));
        }
        Ok(())
    }

    const fn head_dim(&self) -> usize {
        self.hidden_size / self.decoder_attention_heads
    }

    /// Names of the cache inputs paired with the outputs that refill them
    fn cache_names(&self) -> Vec<CacheEntry> {
        let mut entries = Vec::with_capacity(self.decoder_layers * 4);

        for layer in 0..self.decoder_layers {
            for (attention, is_cross) in [("decoder", false), ("encoder", true)] {
                for tensor in ["key", "value"] {
                    entries.push(CacheEntry {
                        input: format!("past_key_values.{layer}.{attention}.{tensor}"),
                        output: format!("present.{layer}.{attention}.{tensor}"),
                        is_cross,
                    });
                }
            }
        }

        entries
    }
}

struct CacheEntry {
    input: String,
    output: String,
    is_cross: bool,
}

/// Decoder step bounds for an encoder sequence of `encoder_len` positions
const fn step_limit(encoder_len: usize, reduction_factor: usize) -> usize {
    encoder_len * MAX_LENGTH_RATIO / reduction_factor
}

fn should_stop(step: usize, max_steps: usize, stop_probabilities: &[f32]) -> bool {
    step >= max_steps || stop_probabilities.iter().any(|&p| p >= STOP_THRESHOLD)
}

pub struct SpeechT5Model {
    encoder: OnnxSession,
    decoder: OnnxSession,
    config: SpeechT5Config,
}

impl SpeechT5Model {
    pub fn load(encoder: &Path, decoder: &Path, config: SpeechT5Config, device: ComputeDevice) -> Result<Self> {
        Ok(Self {
            encoder: OnnxSession::load("speech encoder", encoder, device)?,
            decoder: OnnxSession::load("speech decoder", decoder, device)?,
            config,
        })
    }

    fn empty_cache(&self) -> ArrayD<f32> {
        ArrayD::zeros(IxDyn(&[1, self.config.decoder_attention_heads, 0, self.config.head_dim()]))
    }
}

impl SpectrogramModel for SpeechT5Model {
    fn generate_speech(&self, input_ids: &[i64], speaker: &SpeakerEmbedding) -> Result<Spectrogram> {
        let (hidden_states, attention_mask) = self.encoder.run(
            vec![onnx::i64_input("input_ids", onnx::token_row(input_ids)?)?],
            |outputs| {
                Ok((
                    onnx::extract_f32(outputs, "encoder_outputs")?,
                    onnx::extract_i64(outputs, "encoder_attention_mask")?,
                ))
            },
        )?;

        let encoder_len = hidden_states
            .shape()
            .get(1)
            .copied()
            .ok_or_else(|| TtsError::InvalidOutput("encoder output has no sequence axis".to_string()))?;
        let max_steps = step_limit(encoder_len, self.config.reduction_factor);

        let speaker = ArrayD::from_shape_vec(IxDyn(&[1, speaker.dimension()]), speaker.as_slice().to_vec())
            .map_err(|e| TtsError::SpeakerEmbedding(e.to_string()))?;

        let mel_bins = self.config.num_mel_bins;
        let cache_names = self.config.cache_names();
        let mut cache: HashMap<String, ArrayD<f32>> = HashMap::new();
        let mut output_sequence = ArrayD::zeros(IxDyn(&[1, 1, mel_bins]));
        let mut spectrum = Vec::new();
        let mut step = 0;

        loop {
            step += 1;
            let first_step = cache.is_empty();

            let mut inputs = vec![
                onnx::bool_input("use_cache_branch", !first_step)?,
                onnx::f32_input("output_sequence", output_sequence)?,
                onnx::i64_input("encoder_attention_mask", attention_mask.clone())?,
                onnx::f32_input("speaker_embeddings", speaker.clone())?,
                onnx::f32_input("encoder_hidden_states", hidden_states.clone())?,
            ];
            for entry in &cache_names {
                let past = cache.get(&entry.input).cloned().unwrap_or_else(|| self.empty_cache());
                inputs.push(onnx::f32_input_owned(entry.input.clone(), past)?);
            }

            let (next_sequence, step_spectrum, stop_probabilities) = self.decoder.run(inputs, |outputs| {
                for entry in &cache_names {
                    // Cross-attention outputs are only meaningful on the uncached branch
                    if first_step || !entry.is_cross {
                        cache.insert(entry.input.clone(), onnx::extract_f32(outputs, &entry.output)?);
                    }
                }

                Ok((
                    onnx::extract_f32(outputs, "output_sequence_out")?,
                    onnx::extract_f32(outputs, "spectrum")?,
                    onnx::extract_f32(outputs, "prob")?,
                ))
            })?;

            spectrum.extend(step_spectrum.iter().copied());
            output_sequence = next_sequence;

            if should_stop(step, max_steps, stop_probabilities.as_slice().unwrap_or(&[])) {
                break;
            }
        }

        if spectrum.len() % mel_bins != 0 {
            return Err(TtsError::InvalidOutput(format!(
                "spectrum of {} values does not split into {mel_bins} mel bins",
                spectrum.len()
            )));
        }

        tracing::debug!(steps = step, frames = spectrum.len() / mel_bins, "decoded spectrogram");

        Ok(Spectrogram { mel_bins, data: spectrum })
    }
}

/// HiFi-GAN vocoder taking `spectrogram` and returning `waveform`
pub struct HifiGanVocoder {
    session: OnnxSession,
}

impl HifiGanVocoder {
    pub fn load(path: &Path, device: ComputeDevice) -> Result<Self> {
        Ok(Self {
            session: OnnxSession::load("vocoder", path, device)?,
        })
    }
}

impl Vocoder for HifiGanVocoder {
    fn vocode(&self, spectrogram: &Spectrogram) -> Result<Vec<f32>> {
        let input = ArrayD::from_shape_vec(
            IxDyn(&[spectrogram.frames(), spectrogram.mel_bins]),
            spectrogram.data.clone(),
        )
        .map_err(|e| TtsError::InvalidOutput(format!("malformed spectrogram: {e}")))?;

        self.session.run(vec![onnx::f32_input("spectrogram", input)?], |outputs| {
            Ok(onnx::extract_f32(outputs, "waveform")?.into_iter().collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SpeechT5Config {
        serde_json::from_str(
            r#"{
                "decoder_layers": 6,
                "decoder_attention_heads": 12,
                "hidden_size": 768,
                "num_mel_bins": 80,
                "reduction_factor": 2,
                "vocab_size": 81
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn step_limit_scales_with_encoder_length() {
        assert_eq!(step_limit(10, 2), 100);
        assert_eq!(step_limit(3, 2), 30);
    }

    #[test]
    fn decoding_stops_on_probability_or_limit() {
        assert!(!should_stop(1, 10, &[0.1, 0.49]));
        assert!(should_stop(1, 10, &[0.1, 0.5]));
        assert!(should_stop(10, 10, &[0.0]));
    }

    #[test]
    fn cache_names_cover_every_layer() {
        let config = config();
        let names = config.cache_names();

        assert_eq!(names.len(), 24);
        assert_eq!(names[0].input, "past_key_values.0.decoder.key");
        assert_eq!(names[0].output, "present.0.decoder.key");
        assert!(!names[0].is_cross);
        assert_eq!(names[3].input, "past_key_values.0.encoder.value");
        assert!(names[3].is_cross);
        assert_eq!(config.head_dim(), 64);
    }

    #[test]
    fn config_rejects_uneven_heads() {
        let mut config = config();
        config.decoder_attention_heads = 7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_file_is_parsed_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"decoder_layers": 6, "decoder_attention_heads": 12, "hidden_size": 768, "num_mel_bins": 80, "reduction_factor": 0}"#,
        )
        .unwrap();

        let err = SpeechT5Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("reduction_factor"));
    }
}
