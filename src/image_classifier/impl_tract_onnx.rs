use crate::frame_source::Frame;
use crate::image_classifier::interface::{
    Classification, ClassifierError, ImageClassifier, ModelLoadError, ModelLoader,
};
use crate::image_classifier::model_descriptor::{fetch, ModelDescriptor};
use crate::image_classifier::tract::image::frame_to_tensor;
use crate::library::logger::interface::Logger;
use std::sync::Arc;
use tract_onnx::prelude::*;

pub struct ImageClassifierTractOnnx {
    model: TypedRunnableModel<TypedModel>,
    descriptor: ModelDescriptor,
}

impl ImageClassifierTractOnnx {
    pub fn new(descriptor: ModelDescriptor, onnx: &[u8]) -> Result<Self, ModelLoadError> {
        let size = descriptor.image_size as usize;
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(onnx))
            .and_then(|m| m.with_input_fact(0, f32::fact([1, 3, size, size]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| ModelLoadError::Backend(e.to_string()))?;

        Ok(Self { model, descriptor })
    }
}

/// Treats the output as probabilities when it already looks like a softmax,
/// otherwise applies one.
fn to_probabilities(scores: &[f32]) -> Vec<f32> {
    let sum: f32 = scores.iter().sum();
    let in_range = scores.iter().all(|s| (0.0..=1.0).contains(s));
    if in_range && (sum - 1.0).abs() < 1e-3 {
        return scores.to_vec();
    }

    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

impl ImageClassifier for ImageClassifierTractOnnx {
    fn classify(&self, frame: &Frame) -> Result<Vec<Classification>, ClassifierError> {
        let input = frame_to_tensor(
            &frame.image,
            self.descriptor.image_size,
            self.descriptor.input_range,
        )
        .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let outputs = self
            .model
            .run(tvec!(input.into_tvalue()))
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| ClassifierError::Inference("model produced no output".to_string()))?
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let scores: Vec<f32> = output.iter().cloned().collect();
        if scores.len() != self.descriptor.labels.len() {
            return Err(ClassifierError::Inference(format!(
                "model produced {} scores for {} labels",
                scores.len(),
                self.descriptor.labels.len()
            )));
        }

        let mut ranked: Vec<Classification> = self
            .descriptor
            .labels
            .iter()
            .zip(to_probabilities(&scores))
            .map(|(label, confidence)| Classification {
                label: label.clone(),
                confidence,
            })
            .collect();
        ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        Ok(ranked)
    }

    fn labels(&self) -> Vec<String> {
        self.descriptor.labels.clone()
    }
}

pub struct ModelLoaderTractOnnx {
    logger: Arc<dyn Logger + Send + Sync>,
}

impl ModelLoaderTractOnnx {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger: logger.with_namespace("model_loader").with_namespace("onnx"),
        }
    }
}

impl ModelLoader for ModelLoaderTractOnnx {
    fn load(&self, url: &str) -> Result<Arc<dyn ImageClassifier + Send + Sync>, ModelLoadError> {
        let _ = self.logger.info(&format!("Fetching descriptor {}", url));
        let descriptor = ModelDescriptor::parse(&fetch(url)?)?;

        let model_location = descriptor.model_location(url);
        let _ = self
            .logger
            .info(&format!("Fetching model {}", model_location));
        let onnx = fetch(&model_location)?;

        let classifier = ImageClassifierTractOnnx::new(descriptor, &onnx)?;
        let _ = self.logger.info(&format!(
            "Model ready with labels {:?}",
            classifier.labels()
        ));

        Ok(Arc::new(classifier))
    }
}
