use crate::frame_source::Frame;
use crate::image_classifier::interface::{
    Classification, ClassifierError, ImageClassifier, ModelLoadError, ModelLoader,
};
use crate::library::logger::interface::Logger;
use rand::distr::{Distribution, Uniform};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

type Scripted = Result<Vec<Classification>, ClassifierError>;

enum Mode {
    /// Replays results in order; the last one repeats once the script runs out.
    Scripted(VecDeque<Scripted>),
    /// Picks a random label with a random confidence.
    Random(Vec<String>),
}

pub struct ImageClassifierFake {
    logger: Arc<dyn Logger + Send + Sync>,
    mode: Mutex<Mode>,
    labels: Vec<String>,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ImageClassifierFake {
    pub fn scripted(logger: Arc<dyn Logger + Send + Sync>, script: Vec<Scripted>) -> Self {
        let mut labels: Vec<String> = Vec::new();
        for classification in script.iter().flatten().flatten() {
            if !labels.contains(&classification.label) {
                labels.push(classification.label.clone());
            }
        }
        Self::with_mode(logger, Mode::Scripted(script.into()), labels)
    }

    pub fn random(logger: Arc<dyn Logger + Send + Sync>, labels: Vec<String>) -> Self {
        Self::with_mode(logger, Mode::Random(labels.clone()), labels)
    }

    fn with_mode(logger: Arc<dyn Logger + Send + Sync>, mode: Mode, labels: Vec<String>) -> Self {
        Self {
            logger: logger.with_namespace("image_classifier").with_namespace("fake"),
            mode: Mutex::new(mode),
            labels,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of `classify` calls that were ever running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_result(&self) -> Scripted {
        let mut mode = self.mode.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *mode {
            Mode::Scripted(script) => {
                if script.len() > 1 {
                    script.pop_front().unwrap_or(Ok(vec![]))
                } else {
                    script.front().cloned().unwrap_or(Ok(vec![]))
                }
            }
            Mode::Random(labels) => random_classification(labels),
        }
    }
}

fn random_classification(labels: &[String]) -> Scripted {
    if labels.is_empty() {
        return Ok(vec![]);
    }

    let mut rng = rand::rng();
    let index_dist =
        Uniform::new(0, labels.len()).map_err(|e| ClassifierError::Inference(e.to_string()))?;
    let confidence_dist =
        Uniform::new(0.0f32, 1.0).map_err(|e| ClassifierError::Inference(e.to_string()))?;

    Ok(vec![Classification {
        label: labels[index_dist.sample(&mut rng)].clone(),
        confidence: confidence_dist.sample(&mut rng),
    }])
}

impl ImageClassifier for ImageClassifierFake {
    fn classify(&self, frame: &Frame) -> Result<Vec<Classification>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let _ = self.logger.info(&format!(
            "Classifying {}x{} frame...",
            frame.width(),
            frame.height()
        ));

        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        let result = self.next_result();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn labels(&self) -> Vec<String> {
        self.labels.clone()
    }
}

/// Hands out a prepared classifier, or fails like an unreachable model URL.
pub struct ModelLoaderFake {
    classifier: Option<Arc<dyn ImageClassifier + Send + Sync>>,
    requested: Mutex<Vec<String>>,
}

impl ModelLoaderFake {
    pub fn new(classifier: Arc<dyn ImageClassifier + Send + Sync>) -> Self {
        Self {
            classifier: Some(classifier),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            classifier: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ModelLoader for ModelLoaderFake {
    fn load(&self, url: &str) -> Result<Arc<dyn ImageClassifier + Send + Sync>, ModelLoadError> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        self.classifier.clone().ok_or_else(|| ModelLoadError::Fetch {
            location: url.to_string(),
            reason: "model unavailable".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::logger::impl_fake::LoggerFake;
    use image::RgbImage;

    fn frame() -> Frame {
        Frame::mirrored(&RgbImage::new(4, 4))
    }

    #[test]
    fn test_scripted_results_replay_then_repeat_last() {
        let classifier = ImageClassifierFake::scripted(
            Arc::new(LoggerFake::new()),
            vec![
                Ok(vec![Classification::new("pitbull", 0.92)]),
                Ok(vec![Classification::new("nothing", 0.99)]),
            ],
        );

        assert_eq!(classifier.classify(&frame()).unwrap()[0].label, "pitbull");
        assert_eq!(classifier.classify(&frame()).unwrap()[0].label, "nothing");
        assert_eq!(classifier.classify(&frame()).unwrap()[0].label, "nothing");
        assert_eq!(classifier.calls(), 3);
        assert_eq!(classifier.max_in_flight(), 1);
        assert_eq!(classifier.labels(), vec!["pitbull", "nothing"]);
    }

    #[test]
    fn test_random_picks_known_labels() {
        let labels = vec!["pitbull".to_string(), "dalmatier".to_string()];
        let classifier = ImageClassifierFake::random(Arc::new(LoggerFake::new()), labels.clone());

        for _ in 0..20 {
            let result = classifier.classify(&frame()).unwrap();
            assert_eq!(result.len(), 1);
            assert!(labels.contains(&result[0].label));
            assert!((0.0..1.0).contains(&result[0].confidence));
        }
    }

    #[test]
    fn test_loader_records_urls_and_can_fail() {
        let classifier = Arc::new(ImageClassifierFake::random(Arc::new(LoggerFake::new()), vec![]));
        let loader = ModelLoaderFake::new(classifier);

        assert!(loader.load("https://example.test/model.json").is_ok());
        assert_eq!(loader.requested(), vec!["https://example.test/model.json"]);

        let failing = ModelLoaderFake::failing();
        assert!(matches!(
            failing.load("https://example.test/model.json"),
            Err(ModelLoadError::Fetch { .. })
        ));
    }
}
