use std::io::Cursor;

use base64::{Engine, engine::general_purpose::STANDARD};
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::{Result, TtsError};

/// Encode mono `f32` samples as a 16-bit PCM WAV file
///
/// Samples are clipped to `[-1.0, 1.0]` before quantization.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    if sample_rate == 0 {
        return Err(TtsError::Encoding("sample rate must be greater than 0".to_string()));
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer = WavWriter::new(&mut buffer, spec).map_err(|e| TtsError::Encoding(e.to_string()))?;

    for &sample in samples {
        writer
            .write_sample(quantize(sample))
            .map_err(|e| TtsError::Encoding(e.to_string()))?;
    }
    writer.finalize().map_err(|e| TtsError::Encoding(e.to_string()))?;

    Ok(buffer.into_inner())
}

#[allow(clippy::cast_possible_truncation)]
fn quantize(sample: f32) -> i16 {
    let sample = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    (sample * f32::from(i16::MAX)) as i16
}

/// Standard, padded base64 for JSON transport
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
