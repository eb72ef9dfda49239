//! Thin wrapper over ONNX Runtime sessions
//!
//! `Session::run` needs exclusive access, so each wrapper serializes its own
//! calls behind a mutex. Callers share the wrapper freely.

use std::{
    borrow::Cow,
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use ndarray::{ArrayD, IxDyn};
use ort::{
    session::{Session, SessionInputValue, SessionOutputs, builder::GraphOptimizationLevel},
    value::{DynValue, Tensor},
};

use crate::{
    device::ComputeDevice,
    error::{Result, RuntimeContext, TtsError},
};

/// Named inputs for a single run
pub type Inputs = Vec<(Cow<'static, str>, SessionInputValue<'static>)>;

pub struct OnnxSession {
    name: String,
    session: Mutex<Session>,
}

impl OnnxSession {
    /// Load a graph from disk onto the given device
    pub fn load(name: &str, path: &Path, device: ComputeDevice) -> Result<Self> {
        let mut builder = Session::builder()
            .runtime("failed to create session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .runtime("failed to set optimization level")?;

        if let ComputeDevice::Cuda(device_id) = device {
            builder = builder
                .with_execution_providers([ort::ep::CUDA::default()
                    .with_device_id(device_id)
                    .build()
                    .error_on_failure()])
                .runtime("failed to enable CUDA execution provider")?;
        }

        let session = builder
            .commit_from_file(path)
            .runtime(&format!("failed to load {name} from {}", path.display()))?;

        tracing::info!(model = name, path = %path.display(), %device, "loaded ONNX session");

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
        })
    }

    /// Run the graph and read what is needed from its outputs
    ///
    /// Outputs borrow the session, so extraction happens while the lock is held.
    pub fn run<T>(&self, inputs: Inputs, extract: impl FnOnce(&SessionOutputs<'_>) -> Result<T>) -> Result<T> {
        let mut session = lock_session(&self.session);

        let outputs = session
            .run(inputs)
            .runtime(&format!("{} inference failed", self.name))?;

        extract(&outputs)
    }
}

/// Take the session lock even if an earlier run panicked while holding it
///
/// Sessions carry no state between runs.
fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wrap an `f32` array as a named input
pub fn f32_input(name: &'static str, array: ArrayD<f32>) -> Result<(Cow<'static, str>, SessionInputValue<'static>)> {
    let tensor = Tensor::from_array(array).runtime(&format!("failed to build `{name}` tensor"))?;
    Ok((Cow::Borrowed(name), tensor.into_dyn().into()))
}

/// Wrap an `f32` array under a name computed at runtime
pub fn f32_input_owned(name: String, array: ArrayD<f32>) -> Result<(Cow<'static, str>, SessionInputValue<'static>)> {
    let tensor = Tensor::from_array(array).runtime(&format!("failed to build `{name}` tensor"))?;
    Ok((Cow::Owned(name), tensor.into_dyn().into()))
}

pub fn i64_input(name: &'static str, array: ArrayD<i64>) -> Result<(Cow<'static, str>, SessionInputValue<'static>)> {
    let tensor = Tensor::from_array(array).runtime(&format!("failed to build `{name}` tensor"))?;
    Ok((Cow::Borrowed(name), tensor.into_dyn().into()))
}

pub fn bool_input(name: &'static str, value: bool) -> Result<(Cow<'static, str>, SessionInputValue<'static>)> {
    let tensor = Tensor::from_array(ArrayD::from_elem(IxDyn(&[1]), value))
        .runtime(&format!("failed to build `{name}` tensor"))?;
    Ok((Cow::Borrowed(name), tensor.into_dyn().into()))
}

/// A `[1, len]` row of token ids
pub fn token_row(ids: &[i64]) -> Result<ArrayD<i64>> {
    ArrayD::from_shape_vec(IxDyn(&[1, ids.len()]), ids.to_vec())
        .map_err(|e| TtsError::InvalidOutput(format!("failed to shape token ids: {e}")))
}

fn output<'a>(outputs: &'a SessionOutputs<'_>, name: &str) -> Result<&'a DynValue> {
    outputs
        .get(name)
        .ok_or_else(|| TtsError::InvalidOutput(format!("model produced no `{name}` output")))
}

/// Copy a floating point output out of the session, widening `f16` to `f32`
pub fn extract_f32(outputs: &SessionOutputs<'_>, name: &str) -> Result<ArrayD<f32>> {
    let value = output(outputs, name)?;

    if let Ok(view) = value.try_extract_array::<f32>() {
        return Ok(view.to_owned());
    }

    value
        .try_extract_array::<half::f16>()
        .map(|view| view.mapv(half::f16::to_f32))
        .runtime(&format!("`{name}` is neither f32 nor f16"))
}

pub fn extract_i64(outputs: &SessionOutputs<'_>, name: &str) -> Result<ArrayD<i64>> {
    output(outputs, name)?
        .try_extract_array::<i64>()
        .map(|view| view.to_owned())
        .runtime(&format!("failed to read `{name}`"))
}
