//! Background loader: full-store scans off the main context.
//!
//! # Usage
//!
//! ```ignore
//! let mut loader = BackgroundLoader::spawn(store.clone());
//!
//! // Poll each frame
//! if let Some(response) = loader.poll() {
//!     session.apply_worker_response(response);
//! }
//! ```
//!
//! Every [`WorkerCommand`] produces exactly one [`WorkerResponse`]. The
//! worker owns the index it builds and hands it over through the channel, so
//! nothing is shared between the two sides while a pass runs.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{self as channel, Receiver, RecvTimeoutError, TryRecvError};
use glam::DVec3;
use web_time::Instant;

use crate::compartments::CompartmentIndex;
use crate::error::{LoadError, StoreError};
use crate::hierarchy::Point;
use crate::metrics::{LoaderMetrics, PassStats};
use crate::sphere::sphere_from_record;
use crate::store::{PointStore, RecordCursor};

/// Request sent from the main context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerCommand {
  /// Scan the whole store and rebuild the compartment index.
  StartProcessing,
}

/// The single reply to a [`WorkerCommand`].
#[derive(Debug)]
pub enum WorkerResponse {
  ProcessedData {
    compartments: CompartmentIndex,
    stats: PassStats,
  },
  /// The store could not be opened. Nothing was loaded.
  Failed { message: String },
}

/// Non-blocking handle to background passes on rayon's thread pool.
pub struct BackgroundLoader {
  store: Arc<dyn PointStore>,
  /// Receiver for the pending reply.
  receiver: Option<Receiver<WorkerResponse>>,
  metrics: LoaderMetrics,
}

impl BackgroundLoader {
  pub fn new(store: Arc<dyn PointStore>) -> Self {
    Self {
      store,
      receiver: None,
      metrics: LoaderMetrics::new(),
    }
  }

  /// Create a loader and immediately start a full pass.
  pub fn spawn(store: Arc<dyn PointStore>) -> Self {
    let mut loader = Self::new(store);
    loader.send(WorkerCommand::StartProcessing);
    loader
  }

  /// Check if a pass is running or its reply has not been polled yet.
  pub fn is_busy(&self) -> bool {
    self.receiver.is_some()
  }

  /// Start handling `command`.
  ///
  /// Returns `false` (and does nothing) while a previous reply is pending.
  pub fn send(&mut self, command: WorkerCommand) -> bool {
    if self.is_busy() {
      return false;
    }
    let (sender, receiver) = channel::bounded(1);
    self.receiver = Some(receiver);

    let store = Arc::clone(&self.store);
    rayon::spawn(move || {
      let response = match command {
        WorkerCommand::StartProcessing => run_pass(store.as_ref()),
      };
      // Ignore send error (receiver dropped = result discarded)
      let _ = sender.send(response);
    });
    true
  }

  /// Poll for the reply (non-blocking).
  pub fn poll(&mut self) -> Option<WorkerResponse> {
    let receiver = self.receiver.as_ref()?;
    match receiver.try_recv() {
      Ok(response) => self.finish(response),
      Err(TryRecvError::Empty) => None,
      Err(TryRecvError::Disconnected) => {
        self.receiver = None;
        None
      }
    }
  }

  /// Block up to `timeout` for the reply.
  pub fn wait(&mut self, timeout: Duration) -> Result<Option<WorkerResponse>, LoadError> {
    let Some(receiver) = self.receiver.as_ref() else {
      return Ok(None);
    };
    match receiver.recv_timeout(timeout) {
      Ok(response) => Ok(self.finish(response)),
      Err(RecvTimeoutError::Timeout) => Ok(None),
      Err(RecvTimeoutError::Disconnected) => {
        self.receiver = None;
        Err(LoadError::WorkerGone)
      }
    }
  }

  /// Stop listening for the reply. The pass itself runs to completion and
  /// its reply is dropped.
  pub fn detach(&mut self) {
    self.receiver = None;
  }

  pub fn metrics(&self) -> &LoaderMetrics {
    &self.metrics
  }

  fn finish(&mut self, response: WorkerResponse) -> Option<WorkerResponse> {
    self.receiver = None;
    match &response {
      WorkerResponse::ProcessedData { compartments, stats } => self.metrics.record_pass(stats, compartments),
      WorkerResponse::Failed { .. } => self.metrics.record_failure(),
    }
    Some(response)
  }
}

/// Scan the whole store into a fresh index (runs on the worker thread).
#[tracing::instrument(skip_all, name = "loader::run_pass")]
pub fn run_pass(store: &dyn PointStore) -> WorkerResponse {
  let start = Instant::now();
  let cursor = match store.open_cursor() {
    Ok(cursor) => cursor,
    Err(e) => {
      tracing::warn!(error = %e, "background pass could not open the store");
      return WorkerResponse::Failed { message: e.to_string() };
    }
  };

  let mut skipped = 0;
  let positions = match read_sphere_points(cursor, usize::MAX, &mut skipped) {
    Ok(positions) => positions,
    Err(e) => {
      tracing::warn!(error = %e, "background pass aborted reading the store");
      return WorkerResponse::Failed { message: e.to_string() };
    }
  };
  let compartments = CompartmentIndex::bucket_all(&positions);
  let stats = PassStats {
    scanned: positions.len(),
    skipped,
    elapsed_us: start.elapsed().as_micros() as u64,
  };
  tracing::info!(
    scanned = stats.scanned,
    skipped = stats.skipped,
    elapsed_us = stats.elapsed_us,
    "background pass complete"
  );
  WorkerResponse::ProcessedData { compartments, stats }
}

/// Read up to `batch_size` records synchronously as top-level leaves.
pub fn initial_load(store: &dyn PointStore, batch_size: usize) -> Result<Vec<Point>, LoadError> {
  let cursor = store.open_cursor()?;
  let mut skipped = 0;
  let points: Vec<Point> = read_sphere_points(cursor, batch_size, &mut skipped)?
    .into_iter()
    .map(Point::leaf)
    .collect();
  tracing::info!(loaded = points.len(), skipped, "initial batch loaded");
  Ok(points)
}

// Unreadable records are skipped and counted. An I/O error ends the read.
fn read_sphere_points(
  mut cursor: RecordCursor<'_>,
  limit: usize,
  skipped: &mut usize,
) -> Result<Vec<DVec3>, StoreError> {
  let mut points = Vec::new();
  while points.len() < limit {
    let Some(record) = cursor.next() else {
      break;
    };
    match record {
      Ok(r) => points.push(sphere_from_record(r.x, r.y)),
      Err(e @ StoreError::Io(_)) => return Err(e),
      Err(e) => {
        tracing::warn!(error = %e, "skipping unreadable record");
        *skipped += 1;
      }
    }
  }
  Ok(points)
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod loader_test;
