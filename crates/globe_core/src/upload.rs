//! Upload contract: validate a JSON payload, then replace the store.
//!
//! Validation runs over the whole payload before anything is written, so a
//! rejected upload leaves the store as it was. Each upload produces exactly
//! one terminal [`UploadMessage`].

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver};
use serde_json::Value;

use crate::error::UploadError;
use crate::store::{PointRecord, PointStore, RecordId};

/// Success text reported after a committed upload.
pub const UPLOAD_COMPLETE: &str = "Upload complete";

/// Terminal result of one upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadMessage {
  Done(String),
  Error(String),
}

impl UploadMessage {
  pub fn is_done(&self) -> bool {
    matches!(self, Self::Done(_))
  }

  pub fn text(&self) -> &str {
    match self {
      Self::Done(s) | Self::Error(s) => s,
    }
  }
}

/// Parse and check a payload: a JSON array whose every element carries a
/// numeric-or-string `id` and numeric `x` and `y`. Other fields are ignored.
pub fn validate_payload(payload: &str) -> Result<Vec<PointRecord>, UploadError> {
  let value: Value = serde_json::from_str(payload).map_err(UploadError::InvalidJson)?;
  let Value::Array(items) = value else {
    return Err(UploadError::NotAnArray);
  };
  items
    .iter()
    .enumerate()
    .map(|(index, item)| {
      record_from_value(item).map_err(|reason| UploadError::InvalidRecord {
        index,
        reason: reason.to_owned(),
      })
    })
    .collect()
}

fn record_from_value(item: &Value) -> Result<PointRecord, &'static str> {
  let obj = item.as_object().ok_or("not an object")?;
  let id = match obj.get("id") {
    None => return Err("missing id"),
    Some(Value::String(s)) => RecordId::Text(s.clone()),
    Some(v) => RecordId::Int(v.as_i64().ok_or("id must be an integer or a string")?),
  };
  let coord = |key: &str, missing: &'static str, bad: &'static str| match obj.get(key) {
    None => Err(missing),
    Some(v) => v.as_f64().ok_or(bad),
  };
  let x = coord("x", "missing x", "x must be a number")?;
  let y = coord("y", "missing y", "y must be a number")?;
  Ok(PointRecord { id, x, y })
}

/// Validate `payload` and, if valid, replace the contents of `store`.
pub fn try_upload(store: &dyn PointStore, payload: &str) -> Result<usize, UploadError> {
  let records = validate_payload(payload)?;
  let count = records.len();
  store.replace_all(records)?;
  Ok(count)
}

/// Run one upload synchronously and report its terminal message.
#[tracing::instrument(skip_all, name = "upload")]
pub fn upload(store: &dyn PointStore, payload: &str) -> UploadMessage {
  match try_upload(store, payload) {
    Ok(count) => {
      tracing::info!(records = count, "upload committed");
      UploadMessage::Done(UPLOAD_COMPLETE.to_owned())
    }
    Err(e) => {
      tracing::warn!(error = %e, "upload rejected");
      UploadMessage::Error(e.to_string())
    }
  }
}

/// Run an upload on the rayon pool. The receiver yields exactly one message.
pub fn spawn_upload(store: Arc<dyn PointStore>, payload: String) -> Receiver<UploadMessage> {
  let (tx, rx) = bounded(1);
  rayon::spawn(move || {
    let message = upload(store.as_ref(), &payload);
    // Nobody listening is fine.
    let _ = tx.send(message);
  });
  rx
}
