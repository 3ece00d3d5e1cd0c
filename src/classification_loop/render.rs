use crate::classification_loop::core::State;
use crate::classification_loop::main::StopHandle;
use crate::library::logger::interface::Logger;
use crate::presentation::PresentationAdapter;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Redraws the latest frame and label at a fixed rate, independent of how
/// fast the classifier answers.
pub struct RenderLoop {
    presentation: Arc<PresentationAdapter>,
    state: Arc<Mutex<State>>,
    interval: Duration,
    stop_handle: StopHandle,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl RenderLoop {
    pub fn new(
        presentation: Arc<PresentationAdapter>,
        state: Arc<Mutex<State>>,
        interval: Duration,
        stop_handle: StopHandle,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Self {
        Self {
            presentation,
            state,
            interval,
            stop_handle,
            logger: logger.with_namespace("render_loop"),
        }
    }

    pub fn tick(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (frame, label) = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            (state.frame.clone(), state.prediction.label.clone())
        };
        self.presentation.render(frame.as_deref(), &label)
    }

    /// Ticks until the stop handle fires. Returns the number of ticks drawn.
    pub fn run(&self) -> u64 {
        let mut ticks = 0;
        let mut last_error: Option<String> = None;

        while !self.stop_handle.is_stopped() {
            match self.tick() {
                Ok(()) => last_error = None,
                Err(e) => {
                    let message = e.to_string();
                    if last_error.as_ref() != Some(&message) {
                        let _ = self.logger.warn(&format!("Render failed: {}", message));
                        last_error = Some(message);
                    }
                }
            }
            ticks += 1;
            std::thread::sleep(self.interval);
        }

        ticks
    }
}
