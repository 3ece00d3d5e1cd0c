use crate::classification_loop::core::{init, transition, Effect, Event, Phase, State, StopReason};
use crate::classification_loop::run_effect::RunEffect;
use crate::config::Config;
use crate::frame_source::FrameSource;
use crate::image_classifier::interface::ImageClassifier;
use crate::library::logger::interface::Logger;
use crate::presentation::PresentationAdapter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

/// Cancels the classification loop and the render loop.
#[derive(Clone)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
    event_sender: Sender<Event>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let _ = self.event_sender.send(Event::StopRequested);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Capture, classify, publish, repeat. Exactly one classification is in
/// flight while the loop is running.
pub struct ClassificationLoop {
    config: Config,
    logger: Arc<dyn Logger + Send + Sync>,
    state: Arc<Mutex<State>>,
    run_effect: RunEffect,
    event_sender: Sender<Event>,
    event_receiver: Receiver<Event>,
    stopped: Arc<AtomicBool>,
}

impl ClassificationLoop {
    pub fn new(
        config: Config,
        logger: Arc<dyn Logger + Send + Sync>,
        frame_source: FrameSource,
        image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
        presentation: Arc<PresentationAdapter>,
    ) -> Self {
        let logger = logger.with_namespace("classification_loop");
        let (event_sender, event_receiver) = channel();
        let run_effect = RunEffect::new(
            logger.clone(),
            frame_source,
            image_classifier,
            presentation,
            config.classify_timeout,
            event_sender.clone(),
        );

        Self {
            config,
            logger,
            state: Arc::new(Mutex::new(init().0)),
            run_effect,
            event_sender,
            event_receiver,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The context shared with the render loop.
    pub fn state(&self) -> Arc<Mutex<State>> {
        self.state.clone()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stopped: self.stopped.clone(),
            event_sender: self.event_sender.clone(),
        }
    }

    fn publish(&self, state: &State) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state.clone();
    }

    fn run_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            if effect.is_blocking() {
                let run_effect = self.run_effect.clone();
                std::thread::spawn(move || run_effect.run_effect(effect));
            } else {
                self.run_effect.run_effect(effect);
            }
        }
    }

    /// Runs until a stop request or a fatal capture/classification error.
    pub fn run(&self) -> StopReason {
        let (mut current_state, effects) = init();
        self.publish(&current_state);
        self.run_effects(effects);

        if self.stopped.load(Ordering::SeqCst) {
            let _ = self.logger.info("Stopped before the first cycle");
            return StopReason::Cancelled;
        }

        let _ = self.logger.info("Starting classification loop");
        let _ = self.event_sender.send(Event::Start);

        loop {
            // The loop owns a sender, so the channel cannot close under it.
            let Ok(event) = self.event_receiver.recv() else {
                return StopReason::Cancelled;
            };

            let previous_phase = current_state.phase.clone();
            let event_text = event.to_display_string();
            let (new_state, effects) = transition(&self.config, current_state, event);
            current_state = new_state;

            if current_state.phase != previous_phase {
                let _ = self.logger.info(&format!(
                    "{:?} -> {:?} on {}",
                    previous_phase, current_state.phase, event_text
                ));
            }

            self.publish(&current_state);
            self.run_effects(effects);

            if let Phase::Stopped(reason) = current_state.phase {
                return reason;
            }
        }
    }
}
