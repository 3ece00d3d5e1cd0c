use crate::frame_source::Frame;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: &str, confidence: f32) -> Self {
        Self {
            label: label.to_string(),
            confidence,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("inference did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("classifier stopped responding")]
    Disconnected,
}

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("failed to fetch {location}: {reason}")]
    Fetch { location: String, reason: String },
    #[error("invalid model descriptor: {0}")]
    Descriptor(String),
    #[error("failed to build model: {0}")]
    Backend(String),
}

/// Ranked label predictions for a single frame.
pub trait ImageClassifier {
    fn classify(&self, frame: &Frame) -> Result<Vec<Classification>, ClassifierError>;

    /// Every label this classifier can produce.
    fn labels(&self) -> Vec<String>;
}

pub trait ModelLoader {
    fn load(&self, url: &str) -> Result<Arc<dyn ImageClassifier + Send + Sync>, ModelLoadError>;
}

/// Picks the entry with the highest confidence, whatever order the list is in.
pub fn top_classification(classifications: &[Classification]) -> Option<&Classification> {
    classifications
        .iter()
        .filter(|c| !c.confidence.is_nan())
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
}
