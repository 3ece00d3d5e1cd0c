use crate::image_classifier::interface::ModelLoadError;
use serde::Deserialize;

const DEFAULT_MODEL_FILE: &str = "model.onnx";
const DEFAULT_IMAGE_SIZE: u32 = 224;
const DEFAULT_INPUT_RANGE: [f32; 2] = [-1.0, 1.0];

/// The JSON document a model URL points at. Field names follow the
/// Teachable Machine `metadata.json` export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub labels: Vec<String>,
    #[serde(default = "default_image_size")]
    pub image_size: u32,
    #[serde(default = "default_model_file")]
    pub model_file: String,
    /// Pixel values are scaled from `0..=255` into `[low, high]` before
    /// inference. Teachable Machine image models expect `[-1, 1]`.
    #[serde(default = "default_input_range")]
    pub input_range: [f32; 2],
}

fn default_image_size() -> u32 {
    DEFAULT_IMAGE_SIZE
}

fn default_model_file() -> String {
    DEFAULT_MODEL_FILE.to_string()
}

fn default_input_range() -> [f32; 2] {
    DEFAULT_INPUT_RANGE
}

impl ModelDescriptor {
    pub fn parse(json: &[u8]) -> Result<Self, ModelLoadError> {
        let descriptor: ModelDescriptor =
            serde_json::from_slice(json).map_err(|e| ModelLoadError::Descriptor(e.to_string()))?;

        if descriptor.labels.is_empty() {
            return Err(ModelLoadError::Descriptor("no labels".to_string()));
        }
        if descriptor.image_size == 0 {
            return Err(ModelLoadError::Descriptor("imageSize is zero".to_string()));
        }
        let [low, high] = descriptor.input_range;
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(ModelLoadError::Descriptor(format!(
                "inputRange must be increasing, got [{}, {}]",
                low, high
            )));
        }

        Ok(descriptor)
    }

    /// Location of the model weights, relative to the descriptor location.
    pub fn model_location(&self, descriptor_location: &str) -> String {
        resolve_sibling(descriptor_location, &self.model_file)
    }
}

/// Replaces the last path segment of `location` with `file`. Absolute
/// locations in `file` are returned unchanged.
pub fn resolve_sibling(location: &str, file: &str) -> String {
    if file.contains("://") || file.starts_with('/') {
        return file.to_string();
    }

    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or(location);

    match path.rfind('/') {
        Some(index) => format!("{}{}", &path[..=index], file),
        None => file.to_string(),
    }
}

/// Reads a descriptor or model file from a filesystem path, a `file://` URL,
/// or (with the `onnx` feature) an http(s) URL.
pub fn fetch(location: &str) -> Result<Vec<u8>, ModelLoadError> {
    let fetch_error = |reason: String| ModelLoadError::Fetch {
        location: location.to_string(),
        reason,
    };

    if location.starts_with("http://") || location.starts_with("https://") {
        return fetch_http(location).map_err(fetch_error);
    }

    let path = location.strip_prefix("file://").unwrap_or(location);
    std::fs::read(path).map_err(|e| fetch_error(e.to_string()))
}

#[cfg(feature = "onnx")]
fn fetch_http(url: &str) -> Result<Vec<u8>, String> {
    use std::io::Read;

    let response = ureq::get(url).call().map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| e.to_string())?;
    Ok(bytes)
}

#[cfg(not(feature = "onnx"))]
fn fetch_http(_url: &str) -> Result<Vec<u8>, String> {
    Err("http models need the `onnx` feature".to_string())
}
