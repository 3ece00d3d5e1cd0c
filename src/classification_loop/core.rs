use crate::config::Config;
use crate::frame_source::{CaptureError, Frame};
use crate::image_classifier::interface::{top_classification, Classification, ClassifierError};
use std::sync::Arc;

/// Top-ranked output of the most recent classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    AwaitingResult,
    Stopped(StopReason),
}

#[derive(Debug, Clone)]
pub struct State {
    pub phase: Phase,
    pub prediction: Prediction,
    /// The frame the current prediction was made on.
    pub frame: Option<Arc<Frame>>,
    pub completed_cycles: u64,
}

impl State {
    pub fn is_stopped(&self) -> bool {
        matches!(self.phase, Phase::Stopped(_))
    }
}

#[derive(Debug)]
pub enum Event {
    Start,
    ClassifyDone {
        frame: Arc<Frame>,
        result: Result<Vec<Classification>, ClassifierError>,
    },
    CaptureFailed(CaptureError),
    StopRequested,
}

impl Event {
    pub fn to_display_string(&self) -> String {
        match self {
            Event::ClassifyDone { result, .. } => format!("ClassifyDone({:?})", result),
            event => format!("{:?}", event),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    CaptureAndClassify,
    UpdateVisibility { label: String },
    ReportError { message: String },
}

impl Effect {
    /// Effects that wait on the camera or the model and must run off the
    /// loop thread.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Effect::CaptureAndClassify)
    }
}

pub fn init() -> (State, Vec<Effect>) {
    (
        State {
            phase: Phase::Idle,
            prediction: Prediction::default(),
            frame: None,
            completed_cycles: 0,
        },
        vec![],
    )
}

pub fn transition(config: &Config, state: State, event: Event) -> (State, Vec<Effect>) {
    match (state.phase.clone(), event) {
        (Phase::Stopped(_), _) => (state, vec![]),

        (_, Event::StopRequested) => (
            State {
                phase: Phase::Stopped(StopReason::Cancelled),
                ..state
            },
            vec![],
        ),

        (Phase::Idle, Event::Start) => (
            State {
                phase: Phase::AwaitingResult,
                ..state
            },
            vec![Effect::CaptureAndClassify],
        ),

        (Phase::AwaitingResult, Event::ClassifyDone { frame, result }) => match result {
            Ok(classifications) => {
                let mut effects = vec![Effect::CaptureAndClassify];
                let prediction = match top_classification(&classifications) {
                    Some(top) => {
                        if top.confidence > config.confidence_threshold {
                            effects.push(Effect::UpdateVisibility {
                                label: top.label.clone(),
                            });
                        }
                        Prediction {
                            label: top.label.clone(),
                            confidence: top.confidence.clamp(0.0, 1.0),
                        }
                    }
                    None => state.prediction.clone(),
                };

                (
                    State {
                        phase: Phase::AwaitingResult,
                        prediction,
                        frame: Some(frame),
                        completed_cycles: state.completed_cycles + 1,
                    },
                    effects,
                )
            }
            Err(error) => fail(state, format!("Classification failed: {}", error)),
        },

        (Phase::AwaitingResult, Event::CaptureFailed(error)) => fail(state, error.to_string()),

        // Duplicate starts and stray results never issue a second request.
        _ => (state, vec![]),
    }
}

fn fail(state: State, message: String) -> (State, Vec<Effect>) {
    (
        State {
            phase: Phase::Stopped(StopReason::Failed(message.clone())),
            ..state
        },
        vec![Effect::ReportError { message }],
    )
}
