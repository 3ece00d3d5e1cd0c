use crate::device_display::interface::DeviceDisplay;
use image::RgbImage;
use std::collections::BTreeMap;
use std::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    Init { width: u32, height: u32 },
    Clear,
    DrawFrame { width: u32, height: u32 },
    DrawLabel(String),
    SetRegionVisible { region: String, visible: bool },
    Present,
}

/// Keeps the region state and every call it received.
#[derive(Default)]
pub struct DeviceDisplayFake {
    pub calls: Vec<DisplayCall>,
    pub regions: BTreeMap<String, bool>,
    pub last_label: Option<String>,
    pub fail_region_updates: bool,
}

impl DeviceDisplayFake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible_regions(&self) -> Vec<String> {
        self.regions
            .iter()
            .filter(|(_, visible)| **visible)
            .map(|(region, _)| region.clone())
            .collect()
    }

    pub fn presents(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DisplayCall::Present))
            .count()
    }
}

impl DeviceDisplay for DeviceDisplayFake {
    fn init(
        &mut self,
        width: u32,
        height: u32,
        regions: &[String],
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.calls.push(DisplayCall::Init { width, height });
        for region in regions {
            self.regions.insert(region.clone(), true);
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.calls.push(DisplayCall::Clear);
        Ok(())
    }

    fn draw_frame(&mut self, image: &RgbImage) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.calls.push(DisplayCall::DrawFrame {
            width: image.width(),
            height: image.height(),
        });
        Ok(())
    }

    fn draw_label(&mut self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.calls.push(DisplayCall::DrawLabel(text.to_string()));
        self.last_label = Some(text.to_string());
        Ok(())
    }

    fn set_region_visible(
        &mut self,
        region: &str,
        visible: bool,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.fail_region_updates {
            return Err(format!("region {} is detached", region).into());
        }
        if !self.regions.contains_key(region) {
            return Err(format!("no region named {}", region).into());
        }
        self.calls.push(DisplayCall::SetRegionVisible {
            region: region.to_string(),
            visible,
        });
        self.regions.insert(region.to_string(), visible);
        Ok(())
    }

    fn present(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.calls.push(DisplayCall::Present);
        Ok(())
    }
}
