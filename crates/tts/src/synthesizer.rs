use std::time::Instant;

use vibevoice_telemetry::metrics;

use crate::{
    error::{Result, TtsError},
    model::{FALLBACK_SAMPLE_RATE, ModelContext, ModelFamily},
    types::SynthesisResult,
    wav,
};

/// Whitespace plus the ASCII file, group, record and unit separators
fn is_blank(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

/// Trim `text` and cut it to at most `max_chars` characters
///
/// Fails with [`TtsError::EmptyText`] when nothing is left after trimming.
pub fn prepare_text(text: &str, max_chars: usize) -> Result<&str> {
    let trimmed = text.trim_matches(is_blank);
    if trimmed.is_empty() {
        return Err(TtsError::EmptyText);
    }

    Ok(match trimmed.char_indices().nth(max_chars) {
        Some((end, _)) => &trimmed[..end],
        None => trimmed,
    })
}

/// Synthesize speech for `text` with the loaded models
///
/// Never fails: every error is reported in the returned payload and the
/// context stays usable for later calls.
pub fn synthesize(context: &ModelContext, text: &str, max_text_chars: usize) -> SynthesisResult {
    let started = Instant::now();
    let family = context.kind();

    let result = render(context, text, max_text_chars);

    match result {
        Ok(audio) => {
            tracing::debug!(
                model_family = %family,
                sample_rate = audio.sample_rate,
                duration = audio.duration,
                "synthesis complete"
            );
            metrics::record_synthesis(family.as_ref(), "success", started.elapsed(), Some(audio.duration));

            SynthesisResult::Success {
                audio: audio.base64,
                sample_rate: audio.sample_rate,
                duration: audio.duration,
            }
        }
        Err(e) => {
            if matches!(e, TtsError::EmptyText) {
                tracing::debug!("rejected empty synthesis input");
            } else {
                tracing::warn!(model_family = %family, error = %e, "synthesis failed");
            }
            metrics::record_synthesis(family.as_ref(), "error", started.elapsed(), None);

            SynthesisResult::error(e.to_string())
        }
    }
}

struct EncodedAudio {
    base64: String,
    sample_rate: u32,
    duration: f64,
}

fn render(context: &ModelContext, text: &str, max_text_chars: usize) -> Result<EncodedAudio> {
    let text = prepare_text(text, max_text_chars)?;

    let (samples, sample_rate) = match context.family() {
        ModelFamily::Primary { preprocessor, model } => {
            let sample_rate = preprocessor
                .sampling_rate()
                .ok_or_else(|| TtsError::ConfigError("preprocessor has no sampling rate".to_string()))?;
            let input_ids = preprocessor.encode(text)?;

            (model.generate(&input_ids)?, sample_rate)
        }
        ModelFamily::Fallback {
            preprocessor,
            model,
            vocoder,
            speaker_embedding,
        } => {
            let input_ids = preprocessor.encode(text)?;
            let spectrogram = model.generate_speech(&input_ids, speaker_embedding)?;

            (vocoder.vocode(&spectrogram)?, FALLBACK_SAMPLE_RATE)
        }
    };

    let wav = wav::encode_wav(&samples, sample_rate)?;

    Ok(EncodedAudio {
        base64: wav::to_base64(&wav),
        sample_rate,
        duration: duration_secs(samples.len(), sample_rate),
    })
}

#[allow(clippy::cast_precision_loss)]
fn duration_secs(sample_count: usize, sample_rate: u32) -> f64 {
    sample_count as f64 / f64::from(sample_rate)
}
