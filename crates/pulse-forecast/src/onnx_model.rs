//! ONNX-based sequence model for exported per-building recurrent networks.
//!
//! Expects a single float32 input shaped `[1, window_len, 1]` and reads the
//! first element of the first output as the next scaled value. Requires the
//! `onnx` feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;

    use ndarray::ArrayView1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use pulse_core::{Error, Result, SEQ_LEN};
    use tracing::{debug, info};

    use crate::model::SequenceModel;

    /// ONNX sequence model for one building.
    pub struct OnnxSequenceModel {
        session: Mutex<Session>,
        window_len: usize,
    }

    impl OnnxSequenceModel {
        /// Load an exported model file.
        pub fn load(model_path: &Path) -> Result<Self> {
            if !model_path.exists() {
                return Err(Error::MissingArtifact(format!(
                    "model {}",
                    model_path.display()
                )));
            }

            // With load-dynamic, ORT_DYLIB_PATH must point to libonnxruntime.so
            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| Error::Inference(format!("Failed to create session builder: {}", e)))?
                .with_intra_threads(1)
                .map_err(|e| Error::Inference(format!("Failed to set threads: {}", e)))?
                .commit_from_file(model_path)
                .map_err(|e| {
                    Error::MissingArtifact(format!(
                        "malformed model {}: {}",
                        model_path.display(),
                        e
                    ))
                })?;

            info!("ONNX sequence model loaded: {}", model_path.display());

            Ok(Self {
                session: Mutex::new(session),
                window_len: SEQ_LEN,
            })
        }
    }

    impl SequenceModel for OnnxSequenceModel {
        fn predict_next(&self, window: ArrayView1<'_, f64>) -> Result<f64> {
            let len = window.len();
            let data: Vec<f32> = window.iter().map(|&v| v as f32).collect();

            let input = Tensor::from_array(([1usize, len, 1usize], data))
                .map_err(|e| Error::Inference(format!("Failed to create input tensor: {}", e)))?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![input])
                .map_err(|e| Error::Inference(format!("ONNX inference failed: {}", e)))?;

            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| Error::Inference(format!("Failed to extract output: {}", e)))?;

            debug!("ONNX output shape: {:?}", shape.iter().collect::<Vec<_>>());

            data.first()
                .map(|&v| f64::from(v))
                .ok_or_else(|| Error::Inference("empty model output".into()))
        }

        fn window_len(&self) -> usize {
            self.window_len
        }

        fn backend(&self) -> &'static str {
            "onnx"
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxSequenceModel;
