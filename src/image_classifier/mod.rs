pub mod impl_fake;
#[cfg(feature = "onnx")]
pub mod impl_tract_onnx;
pub mod interface;
pub mod model_descriptor;
#[cfg(feature = "onnx")]
pub mod tract;
