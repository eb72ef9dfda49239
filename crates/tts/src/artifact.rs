use std::path::PathBuf;

use hf_hub::{
    Repo,
    api::sync::{Api, ApiBuilder},
};
use secrecy::{ExposeSecret, SecretString};
use vibevoice_config::{ArtifactLocation, RepoType};

use crate::error::{Result, TtsError};

/// Environment variables consulted for a Hub token when none is configured
const TOKEN_ENV_VARS: [&str; 3] = ["HF_TOKEN", "HUGGING_FACE_HUB_TOKEN", "HUGGINGFACE_TOKEN"];

/// Resolves model files from a local directory or the Hugging Face Hub
///
/// Hub downloads land in the shared Hub cache (`HF_HOME`), so repeated
/// process starts reuse earlier downloads.
pub struct ArtifactFetcher {
    token: Option<SecretString>,
}

impl ArtifactFetcher {
    /// Create a fetcher, falling back to the usual Hub token variables
    pub fn new(token: Option<SecretString>) -> Self {
        let token = token
            .filter(|token| !token.expose_secret().trim().is_empty())
            .or_else(token_from_env);

        Self { token }
    }

    /// Return a local path for `file` under `location`
    pub fn fetch(&self, location: &ArtifactLocation, file: &str) -> Result<PathBuf> {
        match location {
            ArtifactLocation::Local(dir) => {
                let path = dir.join(file);

                if path.is_file() {
                    Ok(path)
                } else {
                    Err(TtsError::Artifact {
                        source_name: dir.display().to_string(),
                        file: file.to_string(),
                        message: "file does not exist".to_string(),
                    })
                }
            }
            ArtifactLocation::Hub {
                repo,
                revision,
                repo_type,
            } => {
                tracing::debug!(repo, revision, file, "resolving Hub artifact");

                let artifact_error = |message: String| TtsError::Artifact {
                    source_name: format!("{repo}@{revision}"),
                    file: file.to_string(),
                    message,
                };

                let api = self.api().map_err(|e| artifact_error(e.to_string()))?;
                let repo_type = match repo_type {
                    RepoType::Model => hf_hub::RepoType::Model,
                    RepoType::Dataset => hf_hub::RepoType::Dataset,
                };

                api.repo(Repo::with_revision(repo.clone(), repo_type, revision.clone()))
                    .get(file)
                    .map_err(|e| artifact_error(e.to_string()))
            }
        }
    }

    fn api(&self) -> std::result::Result<Api, hf_hub::api::sync::ApiError> {
        let mut builder = ApiBuilder::from_env().with_progress(false);

        if let Some(token) = &self.token {
            builder = builder.with_token(Some(token.expose_secret().to_string()));
        }

        builder.build()
    }
}

fn token_from_env() -> Option<SecretString> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
        .map(SecretString::from)
}
