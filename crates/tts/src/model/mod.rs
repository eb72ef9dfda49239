//! Loaded model families and the context shared by synthesis calls

mod primary;
mod speecht5;

pub use primary::OnnxWaveformModel;
pub use speecht5::{HifiGanVocoder, SpeechT5Config, SpeechT5Model};

use crate::{device::ComputeDevice, error::Result, preprocess::Preprocessor, speaker::SpeakerEmbedding};

/// Sample rate of the fallback family's vocoder output
pub const FALLBACK_SAMPLE_RATE: u32 = 16_000;

/// Text-to-waveform model run as one graph
pub trait WaveformModel: Send + Sync {
    /// Generate mono samples for a row of token ids
    fn generate(&self, input_ids: &[i64]) -> Result<Vec<f32>>;
}

/// Seq2seq model producing a mel spectrogram conditioned on a speaker
pub trait SpectrogramModel: Send + Sync {
    fn generate_speech(&self, input_ids: &[i64], speaker: &SpeakerEmbedding) -> Result<Spectrogram>;
}

/// Neural vocoder mapping a mel spectrogram to samples
pub trait Vocoder: Send + Sync {
    fn vocode(&self, spectrogram: &Spectrogram) -> Result<Vec<f32>>;
}

/// Row-major `[frames, mel_bins]` spectrogram
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    pub mel_bins: usize,
    pub data: Vec<f32>,
}

impl Spectrogram {
    pub fn frames(&self) -> usize {
        self.data.len().checked_div(self.mel_bins).unwrap_or(0)
    }
}

/// Which model family a context holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FamilyKind {
    Primary,
    Fallback,
}

/// The loaded models, tagged by family
pub enum ModelFamily {
    Primary {
        preprocessor: Box<dyn Preprocessor>,
        model: Box<dyn WaveformModel>,
    },
    Fallback {
        preprocessor: Box<dyn Preprocessor>,
        model: Box<dyn SpectrogramModel>,
        vocoder: Box<dyn Vocoder>,
        speaker_embedding: SpeakerEmbedding,
    },
}

impl ModelFamily {
    pub const fn kind(&self) -> FamilyKind {
        match self {
            Self::Primary { .. } => FamilyKind::Primary,
            Self::Fallback { .. } => FamilyKind::Fallback,
        }
    }
}

/// Everything a synthesis call needs, built once per process
pub struct ModelContext {
    device: ComputeDevice,
    family: ModelFamily,
}

impl ModelContext {
    pub const fn new(device: ComputeDevice, family: ModelFamily) -> Self {
        Self { device, family }
    }

    pub const fn device(&self) -> ComputeDevice {
        self.device
    }

    pub const fn family(&self) -> &ModelFamily {
        &self.family
    }

    pub const fn kind(&self) -> FamilyKind {
        self.family.kind()
    }
}
