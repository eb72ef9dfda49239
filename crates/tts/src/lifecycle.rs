//! Process-wide model readiness
//!
//! The context moves from `Loading` to either `Ready` or `Failed` exactly
//! once. Requests that arrive while loading wait for the transition.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    error::{Result, TtsError},
    loader::{FamilyLoader, LoadOutcome, load_model},
    model::{FamilyKind, ModelContext},
};

/// Model lifecycle state
#[derive(Clone)]
pub enum ModelState {
    Loading,
    Ready(Arc<ModelContext>),
    Failed(String),
}

/// Cloneable handle onto the shared model state
#[derive(Clone)]
pub struct ModelHandle {
    state: Arc<watch::Sender<ModelState>>,
}

impl Default for ModelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelHandle {
    /// Create a handle in the `Loading` state
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(ModelState::Loading)),
        }
    }

    /// Create a handle that is already `Ready`
    pub fn ready(context: ModelContext) -> Self {
        let handle = Self::new();
        handle.set_ready(context);
        handle
    }

    pub fn state(&self) -> ModelState {
        self.state.borrow().clone()
    }

    pub fn set_ready(&self, context: ModelContext) {
        self.state.send_replace(ModelState::Ready(Arc::new(context)));
    }

    pub fn set_failed(&self, reason: impl Into<String>) {
        self.state.send_replace(ModelState::Failed(reason.into()));
    }

    /// Wait until loading finishes and return the context
    pub async fn wait_ready(&self) -> std::result::Result<Arc<ModelContext>, String> {
        let mut receiver = self.state.subscribe();

        let state = receiver
            .wait_for(|state| !matches!(state, ModelState::Loading))
            .await
            .map_err(|_| "model state channel closed".to_string())?
            .clone();

        match state {
            ModelState::Ready(context) => Ok(context),
            ModelState::Failed(reason) => Err(reason),
            ModelState::Loading => Err("model is still loading".to_string()),
        }
    }

    /// Run the loader on the blocking pool and publish the outcome
    ///
    /// Returns the loaded family, or the fatal error after moving the
    /// handle to `Failed`.
    pub async fn load<L: FamilyLoader + 'static>(&self, loader: L) -> Result<FamilyKind> {
        let outcome = match tokio::task::spawn_blocking(move || load_model(&loader)).await {
            Ok(outcome) => outcome,
            Err(e) => LoadOutcome::Fatal {
                primary_error: TtsError::Runtime(format!("model loading task failed: {e}")),
                fallback_error: TtsError::Runtime("not attempted".to_string()),
            },
        };

        match outcome {
            LoadOutcome::Primary(context) => {
                tracing::info!(device = %context.device(), "speech model ready (primary)");
                Ok(self.publish(context))
            }
            LoadOutcome::Fallback { context, primary_error } => {
                tracing::warn!(
                    device = %context.device(),
                    primary_error = %primary_error,
                    "speech model ready (fallback)"
                );
                Ok(self.publish(context))
            }
            LoadOutcome::Fatal {
                primary_error,
                fallback_error,
            } => {
                let error = TtsError::ModelUnavailable {
                    primary: primary_error.to_string(),
                    fallback: fallback_error.to_string(),
                };
                tracing::error!(%primary_error, %fallback_error, "no speech model could be loaded");
                self.set_failed(error.to_string());
                Err(error)
            }
        }
    }

    fn publish(&self, context: ModelContext) -> FamilyKind {
        let kind = context.kind();
        self.set_ready(context);
        kind
    }
}
