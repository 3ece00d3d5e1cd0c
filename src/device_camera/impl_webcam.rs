use crate::device_camera::interface::DeviceCamera;
use crate::library::logger::interface::Logger;
use image::RgbImage;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
    Camera,
};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

type Reply<T> = Sender<Result<T, String>>;

enum Request {
    Start(Reply<()>),
    Stop(Reply<()>),
    Capture(Reply<RgbImage>),
}

/// Native webcam through nokhwa. The nokhwa handle is not `Send`, so it
/// lives on a dedicated thread and is driven over a channel.
pub struct DeviceCameraWebcam {
    requests: Mutex<Sender<Request>>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl DeviceCameraWebcam {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        index: u32,
        width: u32,
        height: u32,
    ) -> Self {
        let logger = logger.with_namespace("camera").with_namespace("webcam");
        let (tx, rx) = channel();
        let thread_logger = logger.clone();

        std::thread::spawn(move || serve(rx, thread_logger, index, width, height));

        Self {
            requests: Mutex::new(tx),
            logger,
        }
    }

    fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Request,
    ) -> Result<T, Box<dyn std::error::Error + Send + Sync>> {
        let (reply_tx, reply_rx) = channel();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(make(reply_tx))
            .map_err(|_| "camera thread is gone")?;
        let reply = reply_rx.recv().map_err(|_| "camera thread is gone")?;
        reply.map_err(|e| e.into())
    }
}

fn open_camera(index: u32, width: u32, height: u32) -> Result<Camera, String> {
    for format in [FrameFormat::MJPEG, FrameFormat::YUYV, FrameFormat::RAWRGB] {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new_from(width, height, format, 30),
        ));
        if let Ok(camera) = Camera::new(CameraIndex::Index(index), requested) {
            return Ok(camera);
        }
    }

    let fallback = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
    Camera::new(CameraIndex::Index(index), fallback).map_err(|e| e.to_string())
}

fn serve(
    requests: Receiver<Request>,
    logger: Arc<dyn Logger + Send + Sync>,
    index: u32,
    width: u32,
    height: u32,
) {
    let mut camera: Option<Camera> = None;

    for request in requests {
        match request {
            Request::Start(reply) => {
                let result = open_camera(index, width, height).and_then(|mut c| {
                    c.open_stream().map_err(|e| e.to_string())?;
                    let _ = logger.info(&format!("Stream opened: {:?}", c.camera_format()));
                    camera = Some(c);
                    Ok(())
                });
                let _ = reply.send(result);
            }
            Request::Stop(reply) => {
                let result = match camera.take() {
                    Some(mut c) => c.stop_stream().map_err(|e| e.to_string()),
                    None => Ok(()),
                };
                let _ = reply.send(result);
            }
            Request::Capture(reply) => {
                let result = match camera.as_mut() {
                    Some(c) => c
                        .frame()
                        .and_then(|buffer| buffer.decode_image::<RgbFormat>())
                        .map_err(|e| e.to_string()),
                    None => Err("camera is not started".to_string()),
                };
                let _ = reply.send(result);
            }
        }
    }
}

impl DeviceCamera for DeviceCameraWebcam {
    fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.logger.info("Starting camera...")?;
        self.request(Request::Start)
    }

    fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.logger.info("Stopping camera...")?;
        self.request(Request::Stop)
    }

    fn capture_frame(&self) -> Result<RgbImage, Box<dyn std::error::Error + Send + Sync>> {
        self.request(Request::Capture)
    }
}
