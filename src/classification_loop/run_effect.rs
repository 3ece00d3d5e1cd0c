use crate::classification_loop::core::{Effect, Event};
use crate::frame_source::{Frame, FrameSource};
use crate::image_classifier::interface::{Classification, ClassifierError, ImageClassifier};
use crate::library::logger::interface::Logger;
use crate::presentation::PresentationAdapter;
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct RunEffect {
    logger: Arc<dyn Logger + Send + Sync>,
    frame_source: FrameSource,
    image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
    presentation: Arc<PresentationAdapter>,
    classify_timeout: Duration,
    event_sender: Sender<Event>,
}

impl RunEffect {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        frame_source: FrameSource,
        image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
        presentation: Arc<PresentationAdapter>,
        classify_timeout: Duration,
        event_sender: Sender<Event>,
    ) -> Self {
        Self {
            logger,
            frame_source,
            image_classifier,
            presentation,
            classify_timeout,
            event_sender,
        }
    }

    pub fn run_effect(&self, effect: Effect) {
        match effect {
            Effect::CaptureAndClassify => {
                let event = match self.frame_source.capture() {
                    Ok(frame) => {
                        let frame = Arc::new(frame);
                        let result = self.classify_with_timeout(frame.clone());
                        Event::ClassifyDone { frame, result }
                    }
                    Err(error) => Event::CaptureFailed(error),
                };
                let _ = self.event_sender.send(event);
            }
            Effect::UpdateVisibility { label } => {
                self.presentation.show_label(&label);
            }
            Effect::ReportError { message } => {
                let _ = self.logger.error(&message);
            }
        }
    }

    /// Runs the classifier on a worker thread and gives up after the
    /// configured timeout. A stalled call is left to finish on its own.
    fn classify_with_timeout(
        &self,
        frame: Arc<Frame>,
    ) -> Result<Vec<Classification>, ClassifierError> {
        let (result_sender, result_receiver) = channel();
        let image_classifier = self.image_classifier.clone();

        std::thread::spawn(move || {
            let _ = result_sender.send(image_classifier.classify(&frame));
        });

        match result_receiver.recv_timeout(self.classify_timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(ClassifierError::TimedOut(self.classify_timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(ClassifierError::Disconnected),
        }
    }
}
