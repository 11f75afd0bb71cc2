//! Error types for storage, upload and loading.
//!
//! Every error here is terminal to the one operation that raised it. Nothing
//! retries automatically.

use std::io;

use thiserror::Error;

/// Persisted store failures.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("store unavailable: {0}")]
  Unavailable(String),
  #[error("store I/O failed: {0}")]
  Io(#[from] io::Error),
  #[error("store contents are not valid JSON: {0}")]
  Json(#[from] serde_json::Error),
}

/// Upload payload rejections and commit failures.
#[derive(Debug, Error)]
pub enum UploadError {
  #[error("Upload Failed, payload is not valid JSON: {0}")]
  InvalidJson(#[source] serde_json::Error),
  #[error("Upload Failed, expected a JSON array of points")]
  NotAnArray,
  #[error("Upload Failed, JSON must contain id, x & y parameters (record {index}: {reason})")]
  InvalidRecord { index: usize, reason: String },
  #[error("Upload failed: {0}")]
  Store(#[from] StoreError),
}

/// Background and initial load failures.
#[derive(Debug, Error)]
pub enum LoadError {
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error("background loader disconnected before replying")]
  WorkerGone,
}
