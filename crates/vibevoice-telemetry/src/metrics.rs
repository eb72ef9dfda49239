//! Metric names and recording helpers for the synthesis path

use std::{sync::OnceLock, time::Duration};

use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram},
};

/// Wall-clock time of one synthesis call, in seconds
pub const TTS_SYNTHESIS_DURATION: &str = "tts.synthesis.duration";
/// Number of synthesis calls
pub const TTS_SYNTHESIS_COUNT: &str = "tts.synthesis.count";
/// Seconds of audio produced per successful call
pub const TTS_AUDIO_DURATION: &str = "tts.audio.duration";

struct SynthesisInstruments {
    duration: Histogram<f64>,
    count: Counter<u64>,
    audio: Histogram<f64>,
}

fn instruments() -> &'static SynthesisInstruments {
    static INSTRUMENTS: OnceLock<SynthesisInstruments> = OnceLock::new();

    INSTRUMENTS.get_or_init(|| {
        let meter = opentelemetry::global::meter("vibevoice");

        SynthesisInstruments {
            duration: meter
                .f64_histogram(TTS_SYNTHESIS_DURATION)
                .with_unit("s")
                .with_description("Time spent in one synthesis call")
                .build(),
            count: meter
                .u64_counter(TTS_SYNTHESIS_COUNT)
                .with_description("Synthesis calls by model family and outcome")
                .build(),
            audio: meter
                .f64_histogram(TTS_AUDIO_DURATION)
                .with_unit("s")
                .with_description("Length of generated audio")
                .build(),
        }
    })
}

/// Record one finished synthesis call
///
/// `outcome` is `"success"` or `"error"`. Without a configured meter
/// provider the global no-op meter swallows the measurements.
pub fn record_synthesis(model_family: &str, outcome: &'static str, elapsed: Duration, audio_seconds: Option<f64>) {
    let attributes = [
        KeyValue::new("model_family", model_family.to_string()),
        KeyValue::new("outcome", outcome),
    ];

    let instruments = instruments();
    instruments.duration.record(elapsed.as_secs_f64(), &attributes);
    instruments.count.add(1, &attributes);

    if let Some(seconds) = audio_seconds {
        instruments.audio.record(seconds, &attributes[..1]);
    }
}
