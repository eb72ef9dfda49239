use std::path::Path;

use ndarray::{ArrayD, IxDyn};

use super::WaveformModel;
use crate::{
    device::ComputeDevice,
    error::Result,
    onnx::{self, OnnxSession},
};

/// Single-graph model taking `input_ids` and returning `waveform`
pub struct OnnxWaveformModel {
    session: OnnxSession,
    use_attention_mask: bool,
}

impl OnnxWaveformModel {
    pub fn load(path: &Path, device: ComputeDevice, use_attention_mask: bool) -> Result<Self> {
        Ok(Self {
            session: OnnxSession::load("primary speech model", path, device)?,
            use_attention_mask,
        })
    }
}

impl WaveformModel for OnnxWaveformModel {
    fn generate(&self, input_ids: &[i64]) -> Result<Vec<f32>> {
        let mut inputs = vec![onnx::i64_input("input_ids", onnx::token_row(input_ids)?)?];

        if self.use_attention_mask {
            let mask = ArrayD::from_elem(IxDyn(&[1, input_ids.len()]), 1_i64);
            inputs.push(onnx::i64_input("attention_mask", mask)?);
        }

        // Batch and channel axes are size one, so the flattened buffer is the waveform
        self.session.run(inputs, |outputs| {
            Ok(onnx::extract_f32(outputs, "waveform")?.into_iter().collect())
        })
    }
}
