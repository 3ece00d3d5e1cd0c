use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// What to do with a label that is neither a known region nor the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownLabelPolicy {
    /// Keep whatever is currently visible.
    #[default]
    Ignore,
    /// Hide every region.
    HideAll,
}

#[derive(Error, Debug, PartialEq)]
pub enum VisibilityMapError {
    #[error("at least one region is required")]
    NoRegions,
    #[error("region names must not be empty")]
    EmptyRegionName,
    #[error("region {0:?} is listed more than once")]
    DuplicateRegion(String),
    #[error("sentinel label {0:?} collides with a region name")]
    SentinelIsRegion(String),
}

/// Index of a region, resolved once when the map is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionHandle(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum VisibilityUpdate {
    Shown(String),
    HiddenAll,
    UnknownLabel { label: String, hidden_all: bool },
}

impl VisibilityUpdate {
    /// Whether the display has to be touched for this update.
    pub fn changes_display(&self) -> bool {
        !matches!(
            self,
            VisibilityUpdate::UnknownLabel {
                hidden_all: false,
                ..
            }
        )
    }
}

/// Label to region mapping where at most one region is visible at a time.
#[derive(Debug, Clone)]
pub struct VisibilityMap {
    regions: Vec<String>,
    handles: HashMap<String, RegionHandle>,
    sentinel: String,
    policy: UnknownLabelPolicy,
    visible: Option<RegionHandle>,
}

impl VisibilityMap {
    pub fn new(
        regions: &[String],
        sentinel: &str,
        policy: UnknownLabelPolicy,
    ) -> Result<Self, VisibilityMapError> {
        if regions.is_empty() {
            return Err(VisibilityMapError::NoRegions);
        }

        let mut seen = HashSet::new();
        let mut handles = HashMap::new();
        for (index, region) in regions.iter().enumerate() {
            if region.trim().is_empty() {
                return Err(VisibilityMapError::EmptyRegionName);
            }
            if region == sentinel {
                return Err(VisibilityMapError::SentinelIsRegion(sentinel.to_string()));
            }
            if !seen.insert(region.as_str()) {
                return Err(VisibilityMapError::DuplicateRegion(region.clone()));
            }
            handles.insert(region.clone(), RegionHandle(index));
        }

        Ok(Self {
            regions: regions.to_vec(),
            handles,
            sentinel: sentinel.to_string(),
            policy,
            visible: None,
        })
    }

    pub fn update(&mut self, label: &str) -> VisibilityUpdate {
        if label == self.sentinel {
            self.visible = None;
            return VisibilityUpdate::HiddenAll;
        }

        match self.handles.get(label) {
            Some(handle) => {
                self.visible = Some(*handle);
                VisibilityUpdate::Shown(label.to_string())
            }
            None => {
                let hidden_all = self.policy == UnknownLabelPolicy::HideAll;
                if hidden_all {
                    self.visible = None;
                }
                VisibilityUpdate::UnknownLabel {
                    label: label.to_string(),
                    hidden_all,
                }
            }
        }
    }

    pub fn visible(&self) -> Option<&str> {
        self.visible.map(|RegionHandle(index)| self.regions[index].as_str())
    }

    pub fn is_visible(&self, region: &str) -> bool {
        self.visible() == Some(region)
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn contains(&self, label: &str) -> bool {
        self.handles.contains_key(label)
    }
}
