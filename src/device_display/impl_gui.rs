use crate::device_display::interface::DeviceDisplay;
use image::RgbImage;
use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};

const REGION_PANEL_WIDTH: f32 = 180.0;

#[derive(Clone, Default)]
struct Surface {
    width: u32,
    height: u32,
    frame: Option<Arc<egui::ColorImage>>,
    frame_version: u64,
    label: String,
    regions: Vec<(String, bool)>,
}

#[derive(Clone, Default)]
struct Shared {
    shown: Arc<Mutex<Surface>>,
    context: Arc<Mutex<Option<egui::Context>>>,
}

struct CanvasWindow {
    shared: Shared,
    texture: Option<egui::TextureHandle>,
    texture_version: u64,
}

impl CanvasWindow {
    fn sync_texture(&mut self, ctx: &egui::Context, surface: &Surface) {
        let Some(frame) = &surface.frame else {
            self.texture = None;
            return;
        };
        if self.texture.is_some() && self.texture_version == surface.frame_version {
            return;
        }

        let image = (**frame).clone();
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::default()),
            None => {
                self.texture =
                    Some(ctx.load_texture("frame", image, egui::TextureOptions::default()));
            }
        }
        self.texture_version = surface.frame_version;
    }
}

impl eframe::App for CanvasWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let surface = self
            .shared
            .shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.sync_texture(ctx, &surface);

        egui::SidePanel::right("regions")
            .exact_width(REGION_PANEL_WIDTH)
            .show(ctx, |ui| {
                for (region, visible) in &surface.regions {
                    if *visible {
                        ui.heading(region);
                    }
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let size = egui::vec2(surface.width as f32, surface.height as f32);
            let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
            let painter = ui.painter_at(rect);

            painter.rect_filled(rect, 0.0, egui::Color32::BLACK);

            if let (Some(texture), Some(frame)) = (&self.texture, &surface.frame) {
                let frame_rect = egui::Rect::from_min_size(
                    rect.min,
                    egui::vec2(frame.size[0] as f32, frame.size[1] as f32),
                );
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                painter.image(texture.id(), frame_rect, uv, egui::Color32::WHITE);
            }

            painter.text(
                egui::pos2(rect.center().x, rect.max.y - 4.0),
                egui::Align2::CENTER_BOTTOM,
                &surface.label,
                egui::FontId::proportional(16.0),
                egui::Color32::WHITE,
            );
        });
    }
}

/// Native window built with eframe. Drawing calls go to a back buffer and
/// `present` publishes it to the window, which is driven by [`GuiWindow`].
pub struct DeviceDisplayGui {
    pending: Surface,
    shared: Shared,
}

impl DeviceDisplayGui {
    pub fn new() -> Self {
        Self {
            pending: Surface::default(),
            shared: Shared::default(),
        }
    }

    /// The window showing what this display presents.
    pub fn window(&self) -> GuiWindow {
        GuiWindow {
            shared: self.shared.clone(),
        }
    }
}

impl Default for DeviceDisplayGui {
    fn default() -> Self {
        Self::new()
    }
}

/// The event loop side of [`DeviceDisplayGui`]. winit only creates event
/// loops on the main thread, so `run` must be called from there.
pub struct GuiWindow {
    shared: Shared,
}

impl GuiWindow {
    /// Blocks until the window is closed.
    pub fn run(
        self,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let window_size = [
            width as f32 + REGION_PANEL_WIDTH + 32.0,
            height as f32 + 32.0,
        ];
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size(window_size)
                .with_resizable(false),
            ..Default::default()
        };

        let shared = self.shared;
        eframe::run_native(
            title,
            options,
            Box::new(move |cc| {
                *shared
                    .context
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(cc.egui_ctx.clone());
                Box::new(CanvasWindow {
                    shared,
                    texture: None,
                    texture_version: 0,
                })
            }),
        )
        .map_err(|e| format!("window failed: {}", e).into())
    }

    #[cfg(test)]
    fn snapshot(&self) -> Surface {
        self.shared
            .shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DeviceDisplay for DeviceDisplayGui {
    fn init(
        &mut self,
        width: u32,
        height: u32,
        regions: &[String],
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.pending.width = width;
        self.pending.height = height;
        self.pending.regions = regions.iter().map(|r| (r.clone(), true)).collect();
        *self
            .shared
            .shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = self.pending.clone();
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.pending.frame = None;
        self.pending.label.clear();
        Ok(())
    }

    fn draw_frame(&mut self, image: &RgbImage) -> Result<(), Box<dyn Error + Send + Sync>> {
        let size = [image.width() as usize, image.height() as usize];
        self.pending.frame = Some(Arc::new(egui::ColorImage::from_rgb(size, image.as_raw())));
        self.pending.frame_version += 1;
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
        *self
            .shared
            .shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = self.pending.clone();

        if let Some(ctx) = self
            .shared
            .context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            ctx.request_repaint();
        }
        Ok(())
    }
}
