use std::path::{Path, PathBuf};

use crate::{
    errors::{FaceSegError, Result},
    traits::SegmentationNetwork,
};
use log::{debug, info};
use ndarray::prelude::*;
use ort::value::TensorRef;
use ort::{
    execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{
        builder::{GraphOptimizationLevel, SessionBuilder},
        Session,
    },
};
use parking_lot::Mutex;

pub const DEFAULT_MODEL_PATH: &str = "data/face_seg_fcn8s.onnx";
pub const DEFAULT_INPUT_NAME: &str = "data";
pub const DEFAULT_OUTPUT_NAME: &str = "score";

/// Everything needed to load the network once at start-up.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub model_path: PathBuf,
    pub input_name: String,
    pub output_name: String,
    pub device_id: i32,
    /// Register the TensorRT and CUDA execution providers before the CPU fallback.
    pub use_accelerator: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            input_name: DEFAULT_INPUT_NAME.to_string(),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            device_id: 0,
            use_accelerator: true,
        }
    }
}

/// Face parsing network backed by an ONNX Runtime session.
pub struct OnnxNetwork {
    input_name: String,
    output_name: String,
    session: Mutex<Session>,
}

impl OnnxNetwork {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let model_path = config.model_path.as_path();
        if !model_path.is_file() {
            return Err(FaceSegError::Input {
                path: model_path.to_path_buf(),
                reason: "model file does not exist".to_string(),
            });
        }

        let session = build_session(model_path, config)?;

        ensure_tensor_name(
            "input",
            &config.input_name,
            session.inputs.iter().map(|input| input.name.as_str()),
        )?;
        ensure_tensor_name(
            "output",
            &config.output_name,
            session.outputs.iter().map(|output| output.name.as_str()),
        )?;

        info!("Loaded network from {}", model_path.display());

        Ok(Self {
            input_name: config.input_name.clone(),
            output_name: config.output_name.clone(),
            session: Mutex::new(session),
        })
    }
}

fn build_session(model_path: &Path, config: &NetworkConfig) -> Result<Session> {
    let mut builder = SessionBuilder::new()
        .map_err(|e| FaceSegError::model("session builder initialisation", e))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| FaceSegError::model("graph optimisation setting", e))?;

    if config.use_accelerator {
        debug!(
            "Registering TensorRT/CUDA execution providers on device {}",
            config.device_id
        );
        builder = builder
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(config.device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(config.device_id)
                    .build(),
            ])
            .map_err(|e| FaceSegError::model("execution provider setting", e))?;
    }

    builder
        .with_memory_pattern(true)
        .map_err(|e| FaceSegError::model("memory pattern setting", e))?
        .commit_from_file(model_path)
        .map_err(|e| {
            FaceSegError::model(format!("model load: {}", model_path.display()), e)
        })
}

fn ensure_tensor_name<'a>(
    kind: &str,
    wanted: &str,
    mut available: impl Iterator<Item = &'a str>,
) -> Result<()> {
    if available.any(|name| name == wanted) {
        Ok(())
    } else {
        Err(FaceSegError::validation(
            format!("{kind} tensor"),
            format!("`{wanted}` is not defined by the model"),
        ))
    }
}

impl SegmentationNetwork for OnnxNetwork {
    fn infer(&self, tensor: ArrayView3<f32>) -> Result<Array3<f32>> {
        let batch = tensor.insert_axis(Axis(0)).as_standard_layout().into_owned();

        let mut binding = self.session.lock();
        let outputs = binding.run(ort::inputs![
            self.input_name.as_str() => TensorRef::from_array_view(&batch)?
        ])?;
        let scores = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()?;

        if scores.len_of(Axis(0)) == 0 {
            return Err(FaceSegError::validation(
                "score tensor",
                "has an empty batch dimension",
            ));
        }

        Ok(scores.index_axis(Axis(0), 0).to_owned())
    }
}
