use crate::visibility_map::UnknownLabelPolicy;
use chrono::Offset;
use std::time::Duration;
use thiserror::Error;

pub const ENV_MODEL_URL: &str = "WEBCAM_CLASSIFIER_MODEL_URL";
pub const ENV_THRESHOLD: &str = "WEBCAM_CLASSIFIER_THRESHOLD";
pub const ENV_DISPLAY: &str = "WEBCAM_CLASSIFIER_DISPLAY";
pub const ENV_UNKNOWN_LABEL: &str = "WEBCAM_CLASSIFIER_UNKNOWN_LABEL";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("confidence threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f32),
    #[error("at least one display region is required")]
    NoRegions,
    #[error("{resolution} resolution must be non-zero, got {width}x{height}")]
    ZeroResolution {
        resolution: &'static str,
        width: u32,
        height: u32,
    },
    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    Console,
    Gui,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub model_url: String,
    pub confidence_threshold: f32,
    pub capture_width: u32,
    pub capture_height: u32,
    pub surface_width: u32,
    pub surface_height: u32,
    pub regions: Vec<String>,
    pub nothing_label: String,
    pub unknown_label_policy: UnknownLabelPolicy,
    pub render_interval: Duration,
    pub classify_timeout: Duration,
    pub display: DisplayKind,
    pub logger_timezone: chrono::FixedOffset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_url: "models/metadata.json".to_string(),
            confidence_threshold: 0.75,
            capture_width: 320,
            capture_height: 240,
            surface_width: 320,
            surface_height: 260,
            regions: vec![
                "border collie".to_string(),
                "dalmatier".to_string(),
                "pitbull".to_string(),
                "shiba inu".to_string(),
                "yorkshire terrier".to_string(),
            ],
            nothing_label: "nothing".to_string(),
            unknown_label_policy: UnknownLabelPolicy::Ignore,
            render_interval: Duration::from_millis(16),
            classify_timeout: Duration::from_secs(10),
            display: DisplayKind::Console,
            logger_timezone: chrono::Utc.fix(),
        }
    }
}

impl Config {
    /// Default config with `WEBCAM_CLASSIFIER_*` overrides applied, then validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_MODEL_URL) {
            self.model_url = url;
        }

        if let Some(value) = lookup(ENV_THRESHOLD) {
            self.confidence_threshold =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    name: ENV_THRESHOLD,
                    value: value.clone(),
                })?;
        }

        if let Some(value) = lookup(ENV_DISPLAY) {
            self.display = match value.trim().to_lowercase().as_str() {
                "console" => DisplayKind::Console,
                "gui" => DisplayKind::Gui,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: ENV_DISPLAY,
                        value,
                    })
                }
            };
        }

        if let Some(value) = lookup(ENV_UNKNOWN_LABEL) {
            self.unknown_label_policy = match value.trim().to_lowercase().as_str() {
                "ignore" => UnknownLabelPolicy::Ignore,
                "hide-all" | "hide_all" => UnknownLabelPolicy::HideAll,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: ENV_UNKNOWN_LABEL,
                        value,
                    })
                }
            };
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.confidence_threshold));
        }
        if self.regions.is_empty() {
            return Err(ConfigError::NoRegions);
        }
        if self.capture_width == 0 || self.capture_height == 0 {
            return Err(ConfigError::ZeroResolution {
                resolution: "capture",
                width: self.capture_width,
                height: self.capture_height,
            });
        }
        if self.surface_width == 0 || self.surface_height == 0 {
            return Err(ConfigError::ZeroResolution {
                resolution: "surface",
                width: self.surface_width,
                height: self.surface_height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_matches_reference_behavior() {
        let config = Config::default();

        assert_eq!(config.confidence_threshold, 0.75);
        assert_eq!((config.surface_width, config.surface_height), (320, 260));
        assert_eq!((config.capture_width, config.capture_height), (320, 240));
        assert_eq!(config.regions.len(), 5);
        assert_eq!(config.nothing_label, "nothing");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_are_applied() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                (ENV_MODEL_URL, "file:///models/dogs/model.json"),
                (ENV_THRESHOLD, "0.5"),
                (ENV_DISPLAY, "GUI"),
                (ENV_UNKNOWN_LABEL, "hide-all"),
            ]))
            .unwrap();

        assert_eq!(config.model_url, "file:///models/dogs/model.json");
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.display, DisplayKind::Gui);
        assert_eq!(config.unknown_label_policy, UnknownLabelPolicy::HideAll);
    }

    #[test]
    fn test_invalid_override_is_reported() {
        let mut config = Config::default();
        let result = config.apply_overrides(lookup_from(&[(ENV_THRESHOLD, "high")]));

        assert_eq!(
            result,
            Err(ConfigError::InvalidEnv {
                name: ENV_THRESHOLD,
                value: "high".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let config = Config {
            confidence_threshold: 1.5,
            ..Config::default()
        };

        assert_eq!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange(1.5))
        );
    }

    #[test]
    fn test_validate_rejects_empty_regions() {
        let config = Config {
            regions: vec![],
            ..Config::default()
        };

        assert_eq!(config.validate(), Err(ConfigError::NoRegions));
    }
}
