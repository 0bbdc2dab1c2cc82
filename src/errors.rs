use std::path::PathBuf;
use thiserror::Error;

/// Boxed error source carried by the image and model variants.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Structured error types for the face segmentation pipeline.
///
/// Each variant carries the context of the stage that failed (input resolution,
/// filesystem, decoding, inference, ...), so callers can report which image and
/// which operation went wrong without parsing messages.
#[derive(Error, Debug)]
pub enum FaceSegError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Input error: {reason} ({path:?})")]
    Input { path: PathBuf, reason: String },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing error: {operation} failed (file: {path})")]
    ImageProcessing {
        path: String,
        operation: String,
        #[source]
        source: BoxedSource,
    },

    #[error("Model error: {operation} failed")]
    Model {
        operation: String,
        #[source]
        source: BoxedSource,
    },

    #[error("Validation error: {field} {reason}")]
    Validation { field: String, reason: String },

    #[error("Display error: {message}")]
    Display { message: String },
}

pub type Result<T> = std::result::Result<T, FaceSegError>;

impl FaceSegError {
    pub fn model<E>(operation: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Model {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Convert I/O errors to filesystem errors.
///
/// Call sites that know the path and operation should build
/// `FaceSegError::FileSystem` directly; this is only the fallback.
impl From<std::io::Error> for FaceSegError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

/// Convert image crate errors to image processing errors.
impl From<image::ImageError> for FaceSegError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing {
            path: "unknown".to_string(),
            operation: "image processing".to_string(),
            source: Box::new(err),
        }
    }
}

/// Convert ONNX Runtime errors to model errors.
impl From<ort::Error> for FaceSegError {
    fn from(err: ort::Error) -> Self {
        Self::model("ort operation", err)
    }
}

/// Convert ndarray shape errors to model errors.
///
/// Shape errors only arise while moving tensors in and out of the network,
/// so they are reported as part of inference.
impl From<ndarray::ShapeError> for FaceSegError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::model("tensor shape conversion", err)
    }
}
