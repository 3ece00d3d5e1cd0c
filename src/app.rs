use crate::classification_loop::core::StopReason;
use crate::classification_loop::main::{ClassificationLoop, StopHandle};
use crate::classification_loop::render::RenderLoop;
use crate::config::Config;
use crate::device_camera::interface::DeviceCamera;
use crate::device_display::interface::DeviceDisplay;
use crate::frame_source::FrameSource;
use crate::image_classifier::interface::{ImageClassifier, ModelLoader};
use crate::library::logger::interface::Logger;
use crate::presentation::PresentationAdapter;
use crate::visibility_map::VisibilityMap;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub struct App {
    config: Config,
    logger: Arc<dyn Logger + Send + Sync>,
    device_camera: Arc<dyn DeviceCamera + Send + Sync>,
    model_loader: Arc<dyn ModelLoader + Send + Sync>,
    device_display: Arc<Mutex<dyn DeviceDisplay + Send>>,
    stop_requested: AtomicBool,
    stop_handle: Mutex<Option<StopHandle>>,
}

impl App {
    pub fn new(
        config: Config,
        logger: Arc<dyn Logger + Send + Sync>,
        device_camera: Arc<dyn DeviceCamera + Send + Sync>,
        model_loader: Arc<dyn ModelLoader + Send + Sync>,
        device_display: Arc<Mutex<dyn DeviceDisplay + Send>>,
    ) -> Self {
        Self {
            config,
            logger: logger.with_namespace("app"),
            device_camera,
            model_loader,
            device_display,
            stop_requested: AtomicBool::new(false),
            stop_handle: Mutex::new(None),
        }
    }

    /// Cancels a running `start`, or makes the next one return straight after
    /// setup.
    pub fn stop(&self) {
        let slot = self
            .stop_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.stop_requested.store(true, Ordering::SeqCst);
        if let Some(stop_handle) = slot.as_ref() {
            stop_handle.stop();
        }
    }

    fn register(&self, stop_handle: &StopHandle) {
        let mut slot = self
            .stop_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.stop_requested.load(Ordering::SeqCst) {
            stop_handle.stop();
        }
        *slot = Some(stop_handle.clone());
    }

    /// Loads the model, starts the camera and runs both loops until the
    /// classification loop stops.
    pub fn start(&self) -> Result<StopReason, Box<dyn Error + Send + Sync>> {
        self.logger
            .info(&format!("Loading model from {}", self.config.model_url))?;
        let image_classifier = self.model_loader.load(&self.config.model_url)?;

        let visibility = VisibilityMap::new(
            &self.config.regions,
            &self.config.nothing_label,
            self.config.unknown_label_policy,
        )?;
        self.warn_label_mismatch(image_classifier.as_ref());

        let presentation = Arc::new(PresentationAdapter::new(
            self.device_display.clone(),
            visibility,
            self.logger.clone(),
            self.config.surface_width,
            self.config.surface_height,
        ));
        presentation.init()?;

        self.device_camera.start()?;

        let classification_loop = ClassificationLoop::new(
            self.config.clone(),
            self.logger.clone(),
            FrameSource::new(
                self.device_camera.clone(),
                self.config.capture_width,
                self.config.capture_height,
            ),
            image_classifier,
            presentation.clone(),
        );
        let stop_handle = classification_loop.stop_handle();
        self.register(&stop_handle);

        let render_loop = RenderLoop::new(
            presentation,
            classification_loop.state(),
            self.config.render_interval,
            stop_handle.clone(),
            self.logger.clone(),
        );
        let rendering = std::thread::spawn(move || render_loop.run());

        let reason = classification_loop.run();

        stop_handle.stop();
        if rendering.join().is_err() {
            self.logger.warn("Render loop panicked")?;
        }
        self.device_camera.stop()?;

        match &reason {
            StopReason::Cancelled => self.logger.info("Stopped")?,
            StopReason::Failed(message) => {
                self.logger.info(&format!("Stopped after failure: {}", message))?
            }
        }

        Ok(reason)
    }

    fn warn_label_mismatch(&self, image_classifier: &(dyn ImageClassifier + Send + Sync)) {
        let labels = image_classifier.labels();

        for label in &labels {
            if *label != self.config.nothing_label && !self.config.regions.contains(label) {
                let _ = self
                    .logger
                    .warn(&format!("Model label {:?} has no display region", label));
            }
        }

        for region in &self.config.regions {
            if !labels.contains(region) {
                let _ = self
                    .logger
                    .warn(&format!("Region {:?} is never predicted by the model", region));
            }
        }
    }
}
