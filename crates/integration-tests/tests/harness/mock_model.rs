//! In-process stand-ins for the ONNX model families
//!
//! The mock preprocessor emits one token per character and records every
//! text it sees. The mock waveform model emits `SAMPLES_PER_TOKEN` samples
//! per token, so response durations reveal how much text reached the model.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tts::{
    ComputeDevice, ModelContext, ModelFamily, Preprocessor, SpeakerEmbedding, Spectrogram, SpectrogramModel, TtsError,
    Vocoder, WaveformModel,
};

pub const SAMPLES_PER_TOKEN: usize = 100;
pub const PRIMARY_SAMPLE_RATE: u32 = 24_000;

/// Observations shared between a mock family and the test
#[derive(Clone, Default)]
pub struct Probe {
    seen_text: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl Probe {
    pub fn seen_text(&self) -> Vec<String> {
        self.seen_text.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct CharPreprocessor {
    probe: Probe,
    sampling_rate: Option<u32>,
}

impl Preprocessor for CharPreprocessor {
    fn encode(&self, text: &str) -> tts::Result<Vec<i64>> {
        self.probe.seen_text.lock().unwrap().push(text.to_owned());
        Ok(text.chars().map(|c| i64::from(u32::from(c))).collect())
    }

    fn sampling_rate(&self) -> Option<u32> {
        self.sampling_rate
    }
}

struct MockWaveform {
    probe: Probe,
    delay: Duration,
    fail_with: Option<String>,
}

impl WaveformModel for MockWaveform {
    fn generate(&self, input_ids: &[i64]) -> tts::Result<Vec<f32>> {
        self.probe.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_in_flight.fetch_max(current, Ordering::SeqCst);

        std::thread::sleep(self.delay);
        self.probe.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.fail_with {
            Some(message) => Err(TtsError::Runtime(message.clone())),
            None => Ok((0..input_ids.len() * SAMPLES_PER_TOKEN)
                .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
                .collect()),
        }
    }
}

struct MockSpectrogram;

impl SpectrogramModel for MockSpectrogram {
    fn generate_speech(&self, input_ids: &[i64], _speaker: &SpeakerEmbedding) -> tts::Result<Spectrogram> {
        Ok(Spectrogram {
            mel_bins: 80,
            data: vec![0.0; input_ids.len() * 80],
        })
    }
}

/// One frame becomes `SAMPLES_PER_TOKEN` samples
struct MockVocoder;

impl Vocoder for MockVocoder {
    fn vocode(&self, spectrogram: &Spectrogram) -> tts::Result<Vec<f32>> {
        Ok(vec![0.0; spectrogram.frames() * SAMPLES_PER_TOKEN])
    }
}

/// Builder for mock model contexts
pub struct MockModel {
    probe: Probe,
    delay: Duration,
    fail_with: Option<String>,
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            probe: Probe::default(),
            delay: Duration::ZERO,
            fail_with: None,
        }
    }

    /// Make every generation take `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make every generation fail with `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_owned());
        self
    }

    pub fn probe(&self) -> Probe {
        self.probe.clone()
    }

    /// Primary family at `PRIMARY_SAMPLE_RATE`
    pub fn primary(self) -> ModelContext {
        let family = ModelFamily::Primary {
            preprocessor: Box::new(CharPreprocessor {
                probe: self.probe.clone(),
                sampling_rate: Some(PRIMARY_SAMPLE_RATE),
            }),
            model: Box::new(MockWaveform {
                probe: self.probe,
                delay: self.delay,
                fail_with: self.fail_with,
            }),
        };

        ModelContext::new(ComputeDevice::Cpu, family)
    }

    /// Fallback family; the vocoder runs at 16 kHz
    pub fn fallback(self) -> ModelContext {
        let family = ModelFamily::Fallback {
            preprocessor: Box::new(CharPreprocessor {
                probe: self.probe,
                sampling_rate: None,
            }),
            model: Box::new(MockSpectrogram),
            vocoder: Box::new(MockVocoder),
            speaker_embedding: SpeakerEmbedding::new(vec![0.0; 512]).unwrap(),
        };

        ModelContext::new(ComputeDevice::Cpu, family)
    }
}
