//! globe_core - Framework/engine independent sphere point editor
//!
//! This crate holds everything the editor does short of drawing pixels and
//! wiring DOM-style input: it maps screen positions onto a rotated, zoomed unit
//! sphere, keeps the live point set with its nesting hierarchy, records
//! undo/redo snapshots, and pages large datasets in from a 64-compartment
//! spatial partition built off the main context.
//!
//! # Features
//!
//! - **Transform Engine**: rotation, inverse and view matrices, screen to
//!   world picking on the front hemisphere
//! - **Point Hierarchy**: nest a point into a nearby point, burst it back out
//! - **History**: bounded deep-snapshot undo/redo
//! - **Background Loader**: rayon-backed full-store pass producing a
//!   [`CompartmentIndex`], delivered over a crossbeam channel
//! - **Viewport Loader**: zoom-dependent live set with a hysteresis band
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use globe_core::{BackgroundLoader, EditorConfig, EditorSession, MemoryKeyValue, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! let kv = Arc::new(MemoryKeyValue::new());
//! let mut session = EditorSession::open(EditorConfig::default(), store.as_ref(), kv)?;
//! let mut loader = BackgroundLoader::spawn(store);
//!
//! if let Some(response) = loader.poll() {
//!     session.apply_worker_response(response);
//! }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod math;
pub mod sphere;

// Re-export commonly used items
pub use config::{ConfigError, EditorConfig};
pub use constants::{compartment_cells, compartment_index, grid_cell, GRID_SIZE, NUM_COMPARTMENTS};
pub use error::{LoadError, StoreError, UploadError};

// View state and projection
pub mod orientation;
pub mod transform;
pub use orientation::{Orientation, ZoomLimits};
pub use transform::{TransformEngine, Viewport};

// Spatial partition index
pub mod compartments;
pub use compartments::{compartment_index_of, CompartmentIndex};

// Editable points and their history
pub mod hierarchy;
pub mod history;
pub use hierarchy::{BurstOutcome, NestOutcome, Point, PointHierarchy};
pub use history::{History, HistoryControls};

// Persistence collaborators
pub mod store;
pub mod upload;
pub use store::{
  JsonFileKeyValue, JsonFileStore, KeyValueStore, MemoryKeyValue, MemoryStore, PointRecord, PointStore, RecordId,
};
pub use upload::{spawn_upload, upload, validate_payload, UploadMessage};

// Loading
pub mod loader;
pub mod viewport;
pub use loader::{initial_load, BackgroundLoader, WorkerCommand, WorkerResponse};
pub use viewport::{ViewPolicy, ViewportLoader, VisibleSet};

// Interactive session
pub mod session;
pub mod status;
pub use session::{EditorSession, NudgeDirection, RenderFrame, Renderer};
pub use status::StatusLine;

// Metrics (feature-gated collection)
pub mod metrics;
pub use metrics::{LoaderMetrics, PassStats};
