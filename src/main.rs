use app::App;
use config::{Config, DisplayKind};
use device_camera::interface::DeviceCamera;
use device_display::impl_console::DeviceDisplayConsole;
use device_display::impl_gui::DeviceDisplayGui;
use image_classifier::interface::ModelLoader;
use library::logger::impl_console::LoggerConsole;
use library::logger::interface::Logger;
use std::sync::{Arc, Mutex};
use std::thread;

mod app;
mod classification_loop;
mod config;
mod device_camera;
mod device_display;
mod frame_source;
mod image_classifier;
mod library;
mod presentation;
mod visibility_map;

#[cfg(feature = "webcam")]
fn build_device_camera(
    config: &Config,
    logger: Arc<dyn Logger + Send + Sync>,
) -> Arc<dyn DeviceCamera + Send + Sync> {
    use device_camera::impl_webcam::DeviceCameraWebcam;
    Arc::new(DeviceCameraWebcam::new(
        logger,
        0,
        config.capture_width,
        config.capture_height,
    ))
}

#[cfg(not(feature = "webcam"))]
fn build_device_camera(
    config: &Config,
    logger: Arc<dyn Logger + Send + Sync>,
) -> Arc<dyn DeviceCamera + Send + Sync> {
    use device_camera::impl_fake::DeviceCameraFake;
    Arc::new(DeviceCameraFake::new(
        logger,
        config.capture_width,
        config.capture_height,
    ))
}

#[cfg(feature = "onnx")]
fn build_model_loader(
    _config: &Config,
    logger: Arc<dyn Logger + Send + Sync>,
) -> Arc<dyn ModelLoader + Send + Sync> {
    use image_classifier::impl_tract_onnx::ModelLoaderTractOnnx;
    Arc::new(ModelLoaderTractOnnx::new(logger))
}

#[cfg(not(feature = "onnx"))]
fn build_model_loader(
    config: &Config,
    logger: Arc<dyn Logger + Send + Sync>,
) -> Arc<dyn ModelLoader + Send + Sync> {
    use image_classifier::impl_fake::{ImageClassifierFake, ModelLoaderFake};
    let mut labels = config.regions.clone();
    labels.push(config.nothing_label.clone());
    Arc::new(ModelLoaderFake::new(Arc::new(ImageClassifierFake::random(
        logger, labels,
    ))))
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;

    let logger: Arc<dyn Logger + Send + Sync> =
        Arc::new(LoggerConsole::new(config.logger_timezone));

    let device_camera = build_device_camera(&config, logger.clone());

    let model_loader = build_model_loader(&config, logger.clone());

    match config.display {
        DisplayKind::Console => {
            let device_display = Arc::new(Mutex::new(DeviceDisplayConsole::new()));

            let app = App::new(config, logger, device_camera, model_loader, device_display);

            app.start()?;
        }
        DisplayKind::Gui => {
            let device_display = DeviceDisplayGui::new();
            let window = device_display.window();
            let (width, height) = (config.surface_width, config.surface_height);

            let app = Arc::new(App::new(
                config,
                logger.clone(),
                device_camera,
                model_loader,
                Arc::new(Mutex::new(device_display)),
            ));

            // The window owns the main thread; both loops run behind it.
            let running = {
                let app = app.clone();
                let logger = logger.clone();
                thread::spawn(move || {
                    let result = app.start();
                    if let Err(e) = &result {
                        let _ = logger.error(&format!("App failed: {}", e));
                    }
                    result
                })
            };

            if let Err(e) = window.run("Webcam Classifier", width, height) {
                let _ = logger.error(&format!("{}", e));
            }

            app.stop();
            match running.join() {
                Ok(result) => {
                    result?;
                }
                Err(_) => return Err("app thread panicked".into()),
            }
        }
    }

    Ok(())
}
