use crate::device_camera::interface::DeviceCamera;
use crate::library::logger::interface::Logger;
use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Camera that serves scripted images, then a moving test pattern.
pub struct DeviceCameraFake {
    logger: Arc<dyn Logger + Send + Sync>,
    width: u32,
    height: u32,
    started: AtomicBool,
    captured: AtomicU64,
    scripted: Mutex<VecDeque<Result<RgbImage, String>>>,
}

impl DeviceCameraFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>, width: u32, height: u32) -> Self {
        Self {
            logger: logger.with_namespace("camera").with_namespace("fake"),
            width,
            height,
            started: AtomicBool::new(false),
            captured: AtomicU64::new(0),
            scripted: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_image(&self, image: RgbImage) {
        self.scripted_queue().push_back(Ok(image));
    }

    pub fn push_failure(&self, message: &str) {
        self.scripted_queue().push_back(Err(message.to_string()));
    }

    pub fn captured_count(&self) -> u64 {
        self.captured.load(Ordering::SeqCst)
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn scripted_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<RgbImage, String>>> {
        self.scripted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn test_pattern(&self, tick: u64) -> RgbImage {
        let shift = (tick % 256) as u32;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            Rgb([
                ((x + shift) % 256) as u8,
                ((y + shift) % 256) as u8,
                ((x + y) % 256) as u8,
            ])
        })
    }
}

impl DeviceCamera for DeviceCameraFake {
    fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.logger.info("Starting camera...")?;
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.logger.info("Stopping camera...")?;
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn capture_frame(&self) -> Result<RgbImage, Box<dyn std::error::Error + Send + Sync>> {
        if !self.is_started() {
            return Err("camera is not started".into());
        }

        let tick = self.captured.fetch_add(1, Ordering::SeqCst);

        match self.scripted_queue().pop_front() {
            Some(Ok(image)) => Ok(image),
            Some(Err(message)) => Err(message.into()),
            None => Ok(self.test_pattern(tick)),
        }
    }
}
