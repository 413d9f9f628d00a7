//! Classification-model inspection engine.
//!
//! Wraps an ONNX image classifier trained on whole frames. The model sees a
//! fixed 224x224 RGB input and emits one score per class, class 0 being the
//! pass class and classes 1 through 6 the defect kinds. Findings from this
//! backend carry no localization.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use ort::logging::LogLevel;
use ort::session::Session;
use ort::value::TensorRef;
use tracing::debug;

use crate::core::config::EngineKind;
use crate::core::errors::InspectError;
use crate::domain::{BBox, Defect, DefectKind, DefectMeta, InferenceResult};

use super::Inspector;

/// Model input edge length in pixels.
const INPUT_SIZE: u32 = 224;

/// Inspector backed by an ONNX classification model.
pub struct OnnxInspector {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    model_path: PathBuf,
}

impl OnnxInspector {
    /// Loads the model and resolves tensor names from the session metadata.
    ///
    /// The artifact is checked on disk before any runtime state is created,
    /// so a bad path fails fast with [`InspectError::ModelArtifactMissing`].
    pub fn new(model_path: impl AsRef<Path>) -> Result<Self, InspectError> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(InspectError::ModelArtifactMissing {
                path: path.to_path_buf(),
            });
        }

        let session = Session::builder()?
            .with_log_level(LogLevel::Error)?
            .commit_from_file(path)
            .map_err(|e| {
                InspectError::runtime_unavailable(format!(
                    "failed to create ONNX session for {}: {e}",
                    path.display()
                ))
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());
        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(InspectError::invalid_input(
                    "model declares no outputs; the artifact may be corrupted",
                ));
            }
        };

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            model_path: path.to_path_buf(),
        })
    }

    /// Returns the path of the loaded model artifact.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Resizes the frame and lays it out as a normalized NCHW tensor.
    fn to_tensor(frame: &RgbImage) -> Array4<f32> {
        let resized = imageops::resize(frame, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
        let mut input = Array4::<f32>::zeros((1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for channel in 0..3 {
                input[[0, channel, y as usize, x as usize]] =
                    f32::from(pixel[channel]) / 255.0;
            }
        }
        input
    }
}

impl Inspector for OnnxInspector {
    fn inspect(&self, frame: &RgbImage) -> Result<InferenceResult, InspectError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(InspectError::invalid_input(format!(
                "frame dimensions must be greater than 0, got {width}x{height}"
            )));
        }

        let input = Self::to_tensor(frame);
        let input_tensor = TensorRef::from_array_view(input.view())?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let mut session = self
            .session
            .lock()
            .map_err(|_| InspectError::invalid_input("Failed to acquire session lock"))?;
        let outputs = session.run(inputs)?;
        let (shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;

        let num_classes = shape.last().copied().unwrap_or(0) as usize;
        if num_classes == 0 || data.len() < num_classes {
            return Err(InspectError::invalid_input(format!(
                "unexpected output shape {shape:?} from '{}'",
                self.output_name
            )));
        }
        let scores = &data[..num_classes];

        // First maximum wins on ties.
        let mut predicted = 0;
        for (index, score) in scores.iter().enumerate() {
            if *score > scores[predicted] {
                predicted = index;
            }
        }
        let confidence = f64::from(scores[predicted]);
        debug!("model scored class {} at {:.3}", predicted, confidence);

        if predicted == 0 {
            return Ok(InferenceResult::pass(confidence));
        }
        match DefectKind::from_class_index(predicted) {
            Some(kind) => Ok(InferenceResult::from_defects(vec![Defect::new(
                kind,
                BBox::new(0, 0, 0, 0),
                confidence.clamp(0.0, 1.0),
                DefectMeta::Empty {},
            )])),
            None => Err(InspectError::invalid_input(format!(
                "model produced unknown class index {predicted}"
            ))),
        }
    }

    fn kind(&self) -> EngineKind {
        EngineKind::ModelBased
    }
}
