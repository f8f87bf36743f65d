use std::path::PathBuf;

use thiserror::Error;

/// Run-level failures. Any of these marks the run as failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Frame extraction failed: {0}")]
    Extraction(String),
    #[error("Failed to write frame index {path:?}: {source}")]
    IndexWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to persist canonical frame {position}: {source}")]
    Persist {
        position: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Remap array inconsistent: position {position} resolves to non-canonical frame {target}")]
    Inconsistent { position: u32, target: u32 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures scoped to a single unit of work (one frame).
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Codec error on {path:?}: {message}")]
    Codec { path: PathBuf, message: String },
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decoded buffer has {actual} bytes, expected {expected}")]
    UnexpectedBuffer { expected: usize, actual: usize },
}
