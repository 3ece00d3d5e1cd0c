use crate::device_display::interface::DeviceDisplay;
use image::RgbImage;
use std::error::Error;

#[derive(Debug, Clone, Default, PartialEq)]
struct Screen {
    frame: Option<(u32, u32)>,
    label: String,
    regions: Vec<(String, bool)>,
}

/// Text stand-in for the canvas. Only prints when what is on screen
/// actually changed, so a 60 Hz render loop stays readable.
pub struct DeviceDisplayConsole {
    width: u32,
    pending: Screen,
    shown: Option<Screen>,
}

impl DeviceDisplayConsole {
    pub fn new() -> Self {
        Self {
            width: 0,
            pending: Screen::default(),
            shown: None,
        }
    }

    fn render_screen(&self, screen: &Screen) -> String {
        let inner = (self.width as usize / 10).max(24);
        let mut out = String::new();
        out.push_str(&format!("┌{}┐\n", "─".repeat(inner)));

        let frame = match screen.frame {
            Some((w, h)) => format!("frame {}x{}", w, h),
            None => "no frame".to_string(),
        };
        out.push_str(&format!("│{:^inner$}│\n", frame, inner = inner));
        out.push_str(&format!("│{:^inner$}│\n", screen.label, inner = inner));
        out.push_str(&format!("├{}┤\n", "─".repeat(inner)));

        for (region, visible) in &screen.regions {
            let marker = if *visible { "■" } else { "□" };
            let line: String = format!(" {} {}", marker, region).chars().take(inner).collect();
            out.push_str(&format!("│{:<inner$}│\n", line, inner = inner));
        }

        out.push_str(&format!("└{}┘", "─".repeat(inner)));
        out
    }
}

impl Default for DeviceDisplayConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceDisplay for DeviceDisplayConsole {
    fn init(
        &mut self,
        width: u32,
        _height: u32,
        regions: &[String],
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.width = width;
        self.pending.regions = regions.iter().map(|r| (r.clone(), true)).collect();
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.pending.frame = None;
        self.pending.label.clear();
        Ok(())
    }

    fn draw_frame(&mut self, image: &RgbImage) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.pending.frame = Some(image.dimensions());
        Ok(())
    }

    fn draw_label(&mut self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.pending.label = text.to_string();
        Ok(())
    }

    fn set_region_visible(
        &mut self,
        region: &str,
        visible: bool,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        match self.pending.regions.iter_mut().find(|(r, _)| r == region) {
            Some(entry) => {
                entry.1 = visible;
                Ok(())
            }
            None => Err(format!("no region named {}", region).into()),
        }
    }

    fn present(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.shown.as_ref() != Some(&self.pending) {
            println!("{}", self.render_screen(&self.pending));
            self.shown = Some(self.pending.clone());
        }
        Ok(())
    }
}
