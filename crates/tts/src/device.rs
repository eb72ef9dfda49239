use std::fmt;

use vibevoice_config::DevicePreference;

/// Device an inference session is placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeDevice {
    Cpu,
    Cuda(i32),
}

impl ComputeDevice {
    /// Resolve a configured preference to a concrete device
    ///
    /// `Auto` probes the ONNX Runtime CUDA execution provider and settles on
    /// the CPU when it is missing.
    pub fn select(preference: DevicePreference, cuda_device_id: i32) -> Self {
        match preference {
            DevicePreference::Cpu => Self::Cpu,
            DevicePreference::Cuda => Self::Cuda(cuda_device_id),
            DevicePreference::Auto if cuda_available() => Self::Cuda(cuda_device_id),
            DevicePreference::Auto => Self::Cpu,
        }
    }

    pub const fn is_gpu(self) -> bool {
        matches!(self, Self::Cuda(_))
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda(id) => write!(f, "cuda:{id}"),
        }
    }
}

fn cuda_available() -> bool {
    use ort::ep::ExecutionProvider;

    match ort::ep::CUDA::default().is_available() {
        Ok(available) => available,
        Err(e) => {
            tracing::debug!(error = %e, "could not probe CUDA execution provider");
            false
        }
    }
}
