use vibevoice_config::ModelConfig;

use crate::{
    artifact::ArtifactFetcher,
    device::ComputeDevice,
    error::{Result, TtsError},
    model::{HifiGanVocoder, ModelContext, ModelFamily, OnnxWaveformModel, SpeechT5Config, SpeechT5Model},
    preprocess::{self, TokenizerPreprocessor},
    speaker::SpeakerEmbedding,
};

/// Result of the one-time model load
pub enum LoadOutcome {
    /// The primary family loaded
    Primary(ModelContext),
    /// The primary family failed and the fallback loaded
    Fallback {
        context: ModelContext,
        primary_error: TtsError,
    },
    /// Both families failed
    Fatal {
        primary_error: TtsError,
        fallback_error: TtsError,
    },
}

/// Source of the two model families
pub trait FamilyLoader: Send {
    /// Device every session of this loader is placed on
    fn device(&self) -> ComputeDevice;

    fn load_primary(&self) -> Result<ModelFamily>;

    fn load_fallback(&self) -> Result<ModelFamily>;
}

/// Try the primary family, then the fallback family
///
/// The fallback is only attempted when the primary fails. Blocks while
/// models are fetched and sessions are built.
pub fn load_model<L: FamilyLoader + ?Sized>(loader: &L) -> LoadOutcome {
    let device = loader.device();
    tracing::info!(%device, "loading primary speech model");

    let primary_error = match loader.load_primary() {
        Ok(family) => return LoadOutcome::Primary(ModelContext::new(device, family)),
        Err(e) => e,
    };

    tracing::warn!(error = %primary_error, "primary speech model unavailable, loading fallback");

    match loader.load_fallback() {
        Ok(family) => LoadOutcome::Fallback {
            context: ModelContext::new(device, family),
            primary_error,
        },
        Err(fallback_error) => LoadOutcome::Fatal {
            primary_error,
            fallback_error,
        },
    }
}

/// Loads ONNX exports from the Hub or from local directories
pub struct HubModelLoader {
    config: ModelConfig,
    fetcher: ArtifactFetcher,
    device: ComputeDevice,
}

impl HubModelLoader {
    pub fn new(config: ModelConfig) -> Self {
        let device = ComputeDevice::select(config.device, config.cuda_device_id);
        let fetcher = ArtifactFetcher::new(config.hf_token.clone());

        Self {
            config,
            fetcher,
            device,
        }
    }
}

fn config_error(e: impl std::fmt::Display) -> TtsError {
    TtsError::ConfigError(e.to_string())
}

impl FamilyLoader for HubModelLoader {
    fn device(&self) -> ComputeDevice {
        self.device
    }

    fn load_primary(&self) -> Result<ModelFamily> {
        let primary = &self.config.primary;
        let location = primary.location().map_err(config_error)?;

        // Reduced precision only pays off on the GPU
        let model_file = match (&primary.half_precision_model_file, self.device) {
            (Some(file), ComputeDevice::Cuda(_)) => file,
            _ => &primary.model_file,
        };

        let tokenizer = self.fetcher.fetch(&location, &primary.tokenizer_file)?;
        let preprocessor_config = self.fetcher.fetch(&location, &primary.preprocessor_config_file)?;
        let sampling_rate = preprocess::read_sampling_rate(&preprocessor_config)?;
        let model_path = self.fetcher.fetch(&location, model_file)?;

        let preprocessor = TokenizerPreprocessor::from_file(&tokenizer)?.with_sampling_rate(sampling_rate);
        let model = OnnxWaveformModel::load(&model_path, self.device, primary.use_attention_mask)?;

        tracing::info!(file = model_file, sampling_rate, "primary speech model ready");

        Ok(ModelFamily::Primary {
            preprocessor: Box::new(preprocessor),
            model: Box::new(model),
        })
    }

    fn load_fallback(&self) -> Result<ModelFamily> {
        let fallback = &self.config.fallback;
        let location = fallback.location().map_err(config_error)?;

        let tokenizer = self.fetcher.fetch(&location, &fallback.tokenizer_file)?;
        let config = SpeechT5Config::from_file(&self.fetcher.fetch(&location, &fallback.config_file)?)?;
        let encoder = self.fetcher.fetch(&location, &fallback.encoder_file)?;
        let decoder = self.fetcher.fetch(&location, &fallback.decoder_file)?;

        let vocoder_location = fallback.vocoder.location().map_err(config_error)?;
        let vocoder = self.fetcher.fetch(&vocoder_location, &fallback.vocoder.model_file)?;

        let speaker = &fallback.speaker;
        let speaker_location = speaker.location().map_err(config_error)?;
        let speaker_table = self.fetcher.fetch(&speaker_location, &speaker.file)?;
        let speaker_embedding = SpeakerEmbedding::from_table_file(&speaker_table, speaker.index, speaker.dimension)?;

        let model = SpeechT5Model::load(&encoder, &decoder, config, self.device)?;
        let vocoder = HifiGanVocoder::load(&vocoder, self.device)?;

        tracing::info!(speaker_index = speaker.index, "fallback speech model ready");

        Ok(ModelFamily::Fallback {
            preprocessor: Box::new(TokenizerPreprocessor::from_file(&tokenizer)?),
            model: Box::new(model),
            vocoder: Box::new(vocoder),
            speaker_embedding,
        })
    }
}
