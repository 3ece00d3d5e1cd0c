use crate::device_display::interface::DeviceDisplay;
use crate::frame_source::Frame;
use crate::library::logger::interface::Logger;
use crate::visibility_map::{VisibilityMap, VisibilityUpdate};
use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Draws frames and labels on a display and keeps its regions in line with
/// the visibility map.
pub struct PresentationAdapter {
    display: Arc<Mutex<dyn DeviceDisplay + Send>>,
    visibility: Mutex<VisibilityMap>,
    logger: Arc<dyn Logger + Send + Sync>,
    width: u32,
    height: u32,
}

impl PresentationAdapter {
    pub fn new(
        display: Arc<Mutex<dyn DeviceDisplay + Send>>,
        visibility: VisibilityMap,
        logger: Arc<dyn Logger + Send + Sync>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            display,
            visibility: Mutex::new(visibility),
            logger: logger.with_namespace("presentation"),
            width,
            height,
        }
    }

    fn display(&self) -> MutexGuard<'_, dyn DeviceDisplay + Send + 'static> {
        self.display.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn visibility(&self) -> MutexGuard<'_, VisibilityMap> {
        self.visibility.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets up the surface with every region hidden.
    pub fn init(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let visibility = self.visibility();
        let mut display = self.display();

        display.init(self.width, self.height, visibility.regions())?;
        for region in visibility.regions() {
            display.set_region_visible(region, false)?;
        }
        display.present()?;
        Ok(())
    }

    /// Hides every region, then reveals the one matching `label`. Unknown
    /// labels are logged and handled according to the map's policy. The map
    /// only records the change once the display has accepted it.
    pub fn show_label(&self, label: &str) -> VisibilityUpdate {
        let mut visibility = self.visibility();
        let mut candidate = visibility.clone();
        let update = candidate.update(label);

        if let VisibilityUpdate::UnknownLabel { label, hidden_all } = &update {
            let _ = self.logger.warn(&format!(
                "No region for label {:?}{}",
                label,
                if *hidden_all {
                    ", hiding all regions"
                } else {
                    ", keeping current regions"
                }
            ));
        }

        if update.changes_display() {
            if let Err(e) = self.apply(&candidate) {
                let _ = self
                    .logger
                    .warn(&format!("Failed to update regions: {}", e));
                return update;
            }
        }

        *visibility = candidate;
        update
    }

    fn apply(&self, visibility: &VisibilityMap) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut display = self.display();
        for region in visibility.regions() {
            display.set_region_visible(region, false)?;
        }
        if let Some(region) = visibility.visible() {
            display.set_region_visible(region, true)?;
        }
        Ok(())
    }

    /// One render tick: black background, the frame at the origin, the label
    /// along the bottom.
    pub fn render(&self, frame: Option<&Frame>, label: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut display = self.display();
        display.clear()?;
        if let Some(frame) = frame {
            display.draw_frame(&frame.image)?;
        }
        display.draw_label(label)?;
        display.present()
    }

    pub fn visible_region(&self) -> Option<String> {
        self.visibility().visible().map(str::to_string)
    }

    pub fn regions(&self) -> Vec<String> {
        self.visibility().regions().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_display::impl_fake::{DeviceDisplayFake, DisplayCall};
    use crate::library::logger::impl_fake::LoggerFake;
    use crate::library::logger::interface::LogLevel;
    use crate::visibility_map::UnknownLabelPolicy;
    use image::RgbImage;

    struct Fixture {
        display: Arc<Mutex<DeviceDisplayFake>>,
        logger: LoggerFake,
        presentation: PresentationAdapter,
    }

    fn fixture(policy: UnknownLabelPolicy) -> Fixture {
        let regions: Vec<String> = ["border collie", "pitbull", "shiba inu"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let display = Arc::new(Mutex::new(DeviceDisplayFake::new()));
        let logger = LoggerFake::new();
        let presentation = PresentationAdapter::new(
            display.clone(),
            VisibilityMap::new(&regions, "nothing", policy).unwrap(),
            Arc::new(logger.clone()),
            320,
            260,
        );
        presentation.init().unwrap();

        Fixture {
            display,
            logger,
            presentation,
        }
    }

    #[test]
    fn test_init_hides_every_region() {
        let f = fixture(UnknownLabelPolicy::Ignore);
        let display = f.display.lock().unwrap();

        assert_eq!(display.calls[0], DisplayCall::Init { width: 320, height: 260 });
        assert_eq!(display.regions.len(), 3);
        assert!(display.visible_regions().is_empty());
    }

    #[test]
    fn test_show_label_reveals_single_region() {
        let f = fixture(UnknownLabelPolicy::Ignore);

        f.presentation.show_label("shiba inu");
        f.presentation.show_label("pitbull");

        assert_eq!(f.display.lock().unwrap().visible_regions(), vec!["pitbull"]);
        assert_eq!(f.presentation.visible_region(), Some("pitbull".to_string()));
    }

    #[test]
    fn test_show_sentinel_hides_everything() {
        let f = fixture(UnknownLabelPolicy::Ignore);
        f.presentation.show_label("pitbull");

        f.presentation.show_label("nothing");

        assert!(f.display.lock().unwrap().visible_regions().is_empty());
    }

    #[test]
    fn test_unknown_label_warns_and_keeps_state() {
        let f = fixture(UnknownLabelPolicy::Ignore);
        f.presentation.show_label("pitbull");
        let calls_before = f.display.lock().unwrap().calls.len();

        f.presentation.show_label("poodle");

        let display = f.display.lock().unwrap();
        assert_eq!(display.calls.len(), calls_before);
        assert_eq!(display.visible_regions(), vec!["pitbull"]);
        assert_eq!(f.logger.count(LogLevel::Warn), 1);
    }

    #[test]
    fn test_unknown_label_hide_all_policy() {
        let f = fixture(UnknownLabelPolicy::HideAll);
        f.presentation.show_label("pitbull");

        f.presentation.show_label("poodle");

        assert!(f.display.lock().unwrap().visible_regions().is_empty());
        assert_eq!(f.logger.count(LogLevel::Warn), 1);
    }

    #[test]
    fn test_display_failure_is_only_a_warning() {
        let f = fixture(UnknownLabelPolicy::Ignore);
        f.display.lock().unwrap().fail_region_updates = true;

        let update = f.presentation.show_label("pitbull");

        assert_eq!(update, VisibilityUpdate::Shown("pitbull".to_string()));
        assert_eq!(f.logger.count(LogLevel::Warn), 1);
    }

    #[test]
    fn test_failed_update_is_not_recorded() {
        let f = fixture(UnknownLabelPolicy::Ignore);
        f.presentation.show_label("shiba inu");
        f.display.lock().unwrap().fail_region_updates = true;

        f.presentation.show_label("pitbull");

        assert_eq!(f.presentation.visible_region(), Some("shiba inu".to_string()));
    }

    #[test]
    fn test_next_update_repairs_partial_display() {
        let f = fixture(UnknownLabelPolicy::Ignore);
        f.presentation.show_label("shiba inu");
        f.display.lock().unwrap().fail_region_updates = true;
        f.presentation.show_label("pitbull");
        f.display.lock().unwrap().fail_region_updates = false;

        f.presentation.show_label("pitbull");

        assert_eq!(f.display.lock().unwrap().visible_regions(), vec!["pitbull"]);
        assert_eq!(f.presentation.visible_region(), Some("pitbull".to_string()));
    }

    #[test]
    fn test_render_draws_frame_then_label() {
        let f = fixture(UnknownLabelPolicy::Ignore);
        let frame = Frame::mirrored(&RgbImage::new(320, 240));

        f.presentation.render(Some(&frame), "pitbull").unwrap();
        f.presentation.render(None, "").unwrap();

        let display = f.display.lock().unwrap();
        let tail: Vec<DisplayCall> = display.calls.iter().rev().take(7).rev().cloned().collect();
        assert_eq!(
            tail,
            vec![
                DisplayCall::Clear,
                DisplayCall::DrawFrame { width: 320, height: 240 },
                DisplayCall::DrawLabel("pitbull".to_string()),
                DisplayCall::Present,
                DisplayCall::Clear,
                DisplayCall::DrawLabel(String::new()),
                DisplayCall::Present,
            ]
        );
    }
}
