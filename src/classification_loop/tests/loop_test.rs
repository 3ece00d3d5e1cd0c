#[cfg(test)]
mod loop_test {

    use crate::classification_loop::core::{Phase, Prediction, StopReason};
    use crate::classification_loop::render::RenderLoop;
    use crate::classification_loop::tests::fixture::{inference_error, ok, Fixture};
    use crate::config::Config;
    use crate::device_display::impl_fake::DisplayCall;
    use crate::frame_source::Frame;
    use crate::image_classifier::impl_fake::ImageClassifierFake;
    use crate::library::logger::impl_fake::LoggerFake;
    use crate::library::logger::interface::LogLevel;
    use crate::visibility_map::UnknownLabelPolicy;
    use image::{Rgb, RgbImage};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_confident_prediction_reveals_its_region() {
        let f = Fixture::new(vec![ok("pitbull", 0.92), inference_error("model unloaded")]);
        let classification_loop = f.classification_loop();

        let reason = classification_loop.run();

        let state = Fixture::final_state(&classification_loop);
        assert!(matches!(reason, StopReason::Failed(_)));
        assert_eq!(
            state.prediction,
            Prediction {
                label: "pitbull".to_string(),
                confidence: 0.92,
            }
        );
        assert_eq!(f.visible_regions(), vec!["pitbull"]);
        assert_eq!(f.logger.count(LogLevel::Error), 1);
    }

    #[test]
    fn test_sentinel_hides_every_region() {
        let f = Fixture::new(vec![
            ok("pitbull", 0.92),
            ok("nothing", 0.99),
            inference_error("model unloaded"),
        ]);
        let classification_loop = f.classification_loop();

        classification_loop.run();

        assert!(f.visible_regions().is_empty());
        assert_eq!(
            Fixture::final_state(&classification_loop).prediction.label,
            "nothing"
        );
    }

    #[test]
    fn test_low_confidence_keeps_regions() {
        let f = Fixture::new(vec![
            ok("pitbull", 0.92),
            ok("dalmatier", 0.75),
            ok("shiba inu", 0.5),
            inference_error("model unloaded"),
        ]);
        let classification_loop = f.classification_loop();

        classification_loop.run();

        let state = Fixture::final_state(&classification_loop);
        assert_eq!(state.prediction.label, "shiba inu");
        assert_eq!(state.completed_cycles, 3);
        assert_eq!(f.visible_regions(), vec!["pitbull"]);
    }

    #[test]
    fn test_unknown_label_is_ignored_with_warning() {
        let f = Fixture::new(vec![
            ok("pitbull", 0.92),
            ok("poodle", 0.95),
            inference_error("model unloaded"),
        ]);
        let classification_loop = f.classification_loop();

        classification_loop.run();

        assert_eq!(f.visible_regions(), vec!["pitbull"]);
        assert_eq!(f.logger.count(LogLevel::Warn), 1);
    }

    #[test]
    fn test_unknown_label_can_hide_all() {
        let config = Config {
            unknown_label_policy: UnknownLabelPolicy::HideAll,
            ..Config::default()
        };
        let logger = LoggerFake::new();
        let classifier = ImageClassifierFake::scripted(
            Arc::new(logger.clone()),
            vec![ok("pitbull", 0.92), ok("poodle", 0.95), inference_error("done")],
        );
        let f = Fixture::with_classifier(config, logger, classifier);

        f.classification_loop().run();

        assert!(f.visible_regions().is_empty());
    }

    #[test]
    fn test_classifier_error_halts_and_keeps_state() {
        let f = Fixture::new(vec![inference_error("out of memory")]);
        let classification_loop = f.classification_loop();

        let reason = classification_loop.run();

        let state = Fixture::final_state(&classification_loop);
        assert_eq!(
            reason,
            StopReason::Failed(
                "Classification failed: inference failed: out of memory".to_string()
            )
        );
        assert_eq!(state.phase, Phase::Stopped(reason));
        assert_eq!(state.prediction, Prediction::default());
        assert_eq!(f.image_classifier.calls(), 1);
        assert_eq!(f.logger.count(LogLevel::Error), 1);
    }

    #[test]
    fn test_capture_failure_halts_without_classifying() {
        let f = Fixture::new(vec![ok("pitbull", 0.92)]);
        f.device_camera.push_failure("permission revoked");
        let classification_loop = f.classification_loop();

        let reason = classification_loop.run();

        assert_eq!(
            reason,
            StopReason::Failed("frame capture failed: permission revoked".to_string())
        );
        assert_eq!(f.image_classifier.calls(), 0);
        assert_eq!(f.logger.count(LogLevel::Error), 1);
    }

    #[test]
    fn test_stalled_classifier_times_out() {
        let config = Config {
            classify_timeout: Duration::from_millis(20),
            ..Config::default()
        };
        let logger = LoggerFake::new();
        let classifier = ImageClassifierFake::scripted(
            Arc::new(logger.clone()),
            vec![ok("pitbull", 0.92)],
        )
        .with_latency(Duration::from_millis(500));
        let f = Fixture::with_classifier(config, logger, classifier);

        let reason = f.classification_loop().run();

        match reason {
            StopReason::Failed(message) => assert!(message.contains("did not finish")),
            StopReason::Cancelled => panic!("expected a timeout"),
        }
        assert!(f.visible_regions().is_empty());
    }

    #[test]
    fn test_stop_handle_cancels_with_one_call_in_flight() {
        let logger = LoggerFake::new();
        let classifier = ImageClassifierFake::scripted(
            Arc::new(logger.clone()),
            vec![ok("pitbull", 0.92)],
        )
        .with_latency(Duration::from_millis(3));
        let f = Fixture::with_classifier(Config::default(), logger, classifier);
        let classification_loop = f.classification_loop();
        let state = classification_loop.state();
        let stop_handle = classification_loop.stop_handle();

        let running = thread::spawn(move || classification_loop.run());
        wait_until(|| state.lock().unwrap().completed_cycles >= 5);
        stop_handle.stop();
        let reason = running.join().unwrap();

        assert_eq!(reason, StopReason::Cancelled);
        assert_eq!(f.image_classifier.max_in_flight(), 1);
        assert_eq!(f.logger.count(LogLevel::Error), 0);
        assert_eq!(f.visible_regions(), vec!["pitbull"]);
    }

    #[test]
    fn test_stop_before_run_never_classifies() {
        let f = Fixture::new(vec![ok("pitbull", 0.92)]);
        let classification_loop = f.classification_loop();
        classification_loop.stop_handle().stop();

        let reason = classification_loop.run();

        assert_eq!(reason, StopReason::Cancelled);
        assert_eq!(f.image_classifier.calls(), 0);
    }

    #[test]
    fn test_same_frame_gives_same_outcome() {
        let logger = LoggerFake::new();
        let classifier = ImageClassifierFake::scripted(
            Arc::new(logger.clone()),
            vec![
                ok("pitbull", 0.92),
                ok("pitbull", 0.92),
                inference_error("model unloaded"),
            ],
        )
        .with_latency(Duration::from_millis(150));
        let f = Fixture::with_classifier(Config::default(), logger, classifier);
        let image = RgbImage::from_pixel(320, 240, Rgb([40, 80, 120]));
        f.device_camera.push_image(image.clone());
        f.device_camera.push_image(image.clone());
        let classification_loop = f.classification_loop();
        let state = classification_loop.state();

        let running = thread::spawn(move || classification_loop.run());
        let mut outcomes = Vec::new();
        for cycle in 1..=2 {
            wait_until(|| {
                state.lock().unwrap().completed_cycles >= cycle
                    && f.times_shown("pitbull") >= cycle
            });
            let snapshot = state.lock().unwrap().clone();
            assert_eq!(snapshot.completed_cycles, cycle);
            outcomes.push((snapshot, f.visible_regions()));
        }
        running.join().unwrap();

        let (first, first_visible) = &outcomes[0];
        let (second, second_visible) = &outcomes[1];
        assert_eq!(
            first.frame.as_ref().map(|frame| &frame.image),
            second.frame.as_ref().map(|frame| &frame.image)
        );
        assert_eq!(
            first.frame.as_ref().map(|frame| &frame.image),
            Some(&Frame::mirrored(&image).image)
        );
        assert_eq!(first.prediction, second.prediction);
        assert_eq!(
            first.prediction,
            Prediction {
                label: "pitbull".to_string(),
                confidence: 0.92,
            }
        );
        assert_eq!(first_visible, second_visible);
        assert_eq!(first_visible, &vec!["pitbull".to_string()]);
    }

    #[test]
    fn test_render_tick_draws_latest_frame_and_label() {
        let f = Fixture::new(vec![ok("pitbull", 0.92), inference_error("model unloaded")]);
        let classification_loop = f.classification_loop();
        classification_loop.run();
        let render_loop = RenderLoop::new(
            f.presentation.clone(),
            classification_loop.state(),
            f.config.render_interval,
            classification_loop.stop_handle(),
            Arc::new(f.logger.clone()),
        );

        render_loop.tick().unwrap();

        let display = f.device_display.lock().unwrap();
        let tail: Vec<DisplayCall> = display.calls.iter().rev().take(4).rev().cloned().collect();
        assert_eq!(
            tail,
            vec![
                DisplayCall::Clear,
                DisplayCall::DrawFrame {
                    width: 320,
                    height: 240
                },
                DisplayCall::DrawLabel("pitbull".to_string()),
                DisplayCall::Present,
            ]
        );
    }

    #[test]
    fn test_render_loop_runs_until_stopped() {
        let f = Fixture::new(vec![ok("pitbull", 0.92)]);
        let classification_loop = f.classification_loop();
        let stop_handle = classification_loop.stop_handle();
        let render_loop = RenderLoop::new(
            f.presentation.clone(),
            classification_loop.state(),
            Duration::from_millis(1),
            stop_handle.clone(),
            Arc::new(f.logger.clone()),
        );
        let presents_before = f.device_display.lock().unwrap().presents();

        let rendering = thread::spawn(move || render_loop.run());
        wait_until(|| f.device_display.lock().unwrap().presents() > presents_before + 2);
        stop_handle.stop();
        let ticks = rendering.join().unwrap();

        assert!(ticks >= 3);
    }
}
