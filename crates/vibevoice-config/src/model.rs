use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;

/// Upper bound on characters passed to the model per request unless overridden
pub const DEFAULT_MAX_TEXT_CHARS: usize = 1000;

/// Model loading configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Compute device preference
    #[serde(default)]
    pub device: DevicePreference,
    /// CUDA device ordinal used when running on GPU
    #[serde(default)]
    pub cuda_device_id: i32,
    /// Input text is cut to this many characters after trimming
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    /// Hugging Face Hub token for gated or private repositories
    #[serde(default)]
    pub hf_token: Option<SecretString>,
    /// Primary text-to-waveform model family
    #[serde(default)]
    pub primary: PrimaryModelConfig,
    /// Fallback seq2seq model family
    #[serde(default)]
    pub fallback: FallbackModelConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            device: DevicePreference::default(),
            cuda_device_id: 0,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            hf_token: None,
            primary: PrimaryModelConfig::default(),
            fallback: FallbackModelConfig::default(),
        }
    }
}

/// Where inference should run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DevicePreference {
    /// CUDA when the execution provider is available, CPU otherwise
    #[default]
    Auto,
    Cpu,
    Cuda,
}

/// Hugging Face Hub repository kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RepoType {
    #[default]
    Model,
    Dataset,
}

/// Resolved location of a set of model artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    /// Files fetched from (and cached for) a Hub repository
    Hub {
        repo: String,
        revision: String,
        repo_type: RepoType,
    },
    /// Files read from a local directory
    Local(PathBuf),
}

fn locate(
    section: &str,
    repo: Option<&String>,
    path: Option<&PathBuf>,
    revision: Option<&String>,
    default_repo: &str,
    repo_type: RepoType,
) -> anyhow::Result<ArtifactLocation> {
    let repo = match (repo, path) {
        (Some(_), Some(_)) => anyhow::bail!("{section} must set only one of `repo` or `path`"),
        (None, Some(path)) => return Ok(ArtifactLocation::Local(path.clone())),
        (Some(repo), None) if repo.trim().is_empty() => {
            anyhow::bail!("{section} must set either a non-empty `repo` or a `path`")
        }
        (Some(repo), None) => repo.clone(),
        (None, None) => default_repo.to_string(),
    };

    Ok(ArtifactLocation::Hub {
        repo,
        revision: revision.cloned().unwrap_or_else(|| "main".to_string()),
        repo_type,
    })
}

/// Primary family: a single text-to-waveform graph plus its preprocessor
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrimaryModelConfig {
    /// Hub repository; the built-in default is used when neither this nor `path` is set
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub revision: Option<String>,
    /// Full-precision graph, used on CPU
    #[serde(default = "default_primary_model_file")]
    pub model_file: String,
    /// Reduced-precision graph, preferred on GPU when set
    #[serde(default = "default_primary_half_model_file")]
    pub half_precision_model_file: Option<String>,
    #[serde(default = "default_tokenizer_file")]
    pub tokenizer_file: String,
    /// JSON file carrying `sampling_rate`
    #[serde(default = "default_preprocessor_config_file")]
    pub preprocessor_config_file: String,
    /// Feed an all-ones `attention_mask` next to `input_ids`
    #[serde(default = "default_true")]
    pub use_attention_mask: bool,
}

impl Default for PrimaryModelConfig {
    fn default() -> Self {
        Self {
            repo: None,
            path: None,
            revision: None,
            model_file: default_primary_model_file(),
            half_precision_model_file: default_primary_half_model_file(),
            tokenizer_file: default_tokenizer_file(),
            preprocessor_config_file: default_preprocessor_config_file(),
            use_attention_mask: true,
        }
    }
}

impl PrimaryModelConfig {
    /// Resolve where the primary artifacts live
    ///
    /// # Errors
    ///
    /// Returns an error when both `repo` and `path` are set, or `repo` is blank
    pub fn location(&self) -> anyhow::Result<ArtifactLocation> {
        locate(
            "model.primary",
            self.repo.as_ref(),
            self.path.as_ref(),
            self.revision.as_ref(),
            DEFAULT_PRIMARY_REPO,
            RepoType::Model,
        )
    }
}

/// Fallback family: encoder/decoder speech model, vocoder and speaker embedding
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackModelConfig {
    /// Hub repository; the built-in default is used when neither this nor `path` is set
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default = "default_encoder_file")]
    pub encoder_file: String,
    /// Merged decoder graph with a `use_cache_branch` switch
    #[serde(default = "default_decoder_file")]
    pub decoder_file: String,
    #[serde(default = "default_tokenizer_file")]
    pub tokenizer_file: String,
    /// Model `config.json` with layer, head and mel-bin counts
    #[serde(default = "default_config_file")]
    pub config_file: String,
    #[serde(default)]
    pub vocoder: VocoderConfig,
    #[serde(default)]
    pub speaker: SpeakerEmbeddingConfig,
}

impl Default for FallbackModelConfig {
    fn default() -> Self {
        Self {
            repo: None,
            path: None,
            revision: None,
            encoder_file: default_encoder_file(),
            decoder_file: default_decoder_file(),
            tokenizer_file: default_tokenizer_file(),
            config_file: default_config_file(),
            vocoder: VocoderConfig::default(),
            speaker: SpeakerEmbeddingConfig::default(),
        }
    }
}

impl FallbackModelConfig {
    /// Resolve where the fallback speech model artifacts live
    ///
    /// # Errors
    ///
    /// Returns an error when both `repo` and `path` are set, or `repo` is blank
    pub fn location(&self) -> anyhow::Result<ArtifactLocation> {
        locate(
            "model.fallback",
            self.repo.as_ref(),
            self.path.as_ref(),
            self.revision.as_ref(),
            DEFAULT_FALLBACK_REPO,
            RepoType::Model,
        )
    }
}

/// Neural vocoder turning mel spectrograms into waveforms
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VocoderConfig {
    /// Hub repository; the built-in default is used when neither this nor `path` is set
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default = "default_vocoder_model_file")]
    pub model_file: String,
}

impl Default for VocoderConfig {
    fn default() -> Self {
        Self {
            repo: None,
            path: None,
            revision: None,
            model_file: default_vocoder_model_file(),
        }
    }
}

impl VocoderConfig {
    /// Resolve where the vocoder artifacts live
    ///
    /// # Errors
    ///
    /// Returns an error when both `repo` and `path` are set, or `repo` is blank
    pub fn location(&self) -> anyhow::Result<ArtifactLocation> {
        locate(
            "model.fallback.vocoder",
            self.repo.as_ref(),
            self.path.as_ref(),
            self.revision.as_ref(),
            DEFAULT_VOCODER_REPO,
            RepoType::Model,
        )
    }
}

/// Fixed speaker identity drawn from a reference embedding table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeakerEmbeddingConfig {
    /// Hub repository; the built-in default is used when neither this nor `path` is set
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default = "default_speaker_repo_type")]
    pub repo_type: RepoType,
    /// Raw little-endian `f32` table (`.bin`) or a 1-D/2-D `.npy` array
    #[serde(default = "default_speaker_file")]
    pub file: String,
    /// Row of the table to use
    #[serde(default)]
    pub index: usize,
    /// Length of one embedding vector
    #[serde(default = "default_speaker_dimension")]
    pub dimension: usize,
}

impl Default for SpeakerEmbeddingConfig {
    fn default() -> Self {
        Self {
            repo: None,
            path: None,
            revision: None,
            repo_type: default_speaker_repo_type(),
            file: default_speaker_file(),
            index: 0,
            dimension: default_speaker_dimension(),
        }
    }
}

impl SpeakerEmbeddingConfig {
    /// Resolve where the speaker embedding table lives
    ///
    /// # Errors
    ///
    /// Returns an error when both `repo` and `path` are set, or `repo` is blank
    pub fn location(&self) -> anyhow::Result<ArtifactLocation> {
        locate(
            "model.fallback.speaker",
            self.repo.as_ref(),
            self.path.as_ref(),
            self.revision.as_ref(),
            DEFAULT_SPEAKER_REPO,
            self.repo_type,
        )
    }
}

const fn default_max_text_chars() -> usize {
    DEFAULT_MAX_TEXT_CHARS
}

const fn default_true() -> bool {
    true
}

const DEFAULT_PRIMARY_REPO: &str = "microsoft/VibeVoice-Realtime-0.5B";

fn default_primary_model_file() -> String {
    "onnx/model.onnx".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_primary_half_model_file() -> Option<String> {
    Some("onnx/model_fp16.onnx".to_string())
}

fn default_tokenizer_file() -> String {
    "tokenizer.json".to_string()
}

fn default_preprocessor_config_file() -> String {
    "preprocessor_config.json".to_string()
}

const DEFAULT_FALLBACK_REPO: &str = "Xenova/speecht5_tts";

fn default_encoder_file() -> String {
    "onnx/encoder_model.onnx".to_string()
}

fn default_decoder_file() -> String {
    "onnx/decoder_model_merged.onnx".to_string()
}

fn default_config_file() -> String {
    "config.json".to_string()
}

const DEFAULT_VOCODER_REPO: &str = "Xenova/speecht5_hifigan";

fn default_vocoder_model_file() -> String {
    "onnx/model.onnx".to_string()
}

const DEFAULT_SPEAKER_REPO: &str = "Xenova/transformers.js-docs";

const fn default_speaker_repo_type() -> RepoType {
    RepoType::Dataset
}

fn default_speaker_file() -> String {
    "speaker_embeddings.bin".to_string()
}

const fn default_speaker_dimension() -> usize {
    512
}
