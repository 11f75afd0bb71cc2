//! Persistence collaborators: the record store and the key-value store.
//!
//! The editor never talks to a concrete database. It consumes a `PointStore`
//! through a lazy forward-only cursor and persists orientation through a
//! `KeyValueStore`. Two implementations of each are provided: in-memory (for
//! tests and embedding) and file-backed (for the CLI).

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Unique record key. Numeric keys order before text keys.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
  Int(i64),
  Text(String),
}

impl From<i64> for RecordId {
  fn from(id: i64) -> Self {
    Self::Int(id)
  }
}

impl From<&str> for RecordId {
  fn from(id: &str) -> Self {
    Self::Text(id.to_owned())
  }
}

/// One persisted planar point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
  pub id: RecordId,
  pub x: f64,
  pub y: f64,
}

impl PointRecord {
  pub fn new(id: impl Into<RecordId>, x: f64, y: f64) -> Self {
    Self {
      id: id.into(),
      x,
      y,
    }
  }
}

/// Lazy, finite, forward-only sequence of records. Not restartable.
pub type RecordCursor<'a> = Box<dyn Iterator<Item = Result<PointRecord, StoreError>> + Send + 'a>;

/// Bulk-readable, bulk-writable ordered record store.
pub trait PointStore: Send + Sync {
  /// Open a cursor over all records in key order.
  fn open_cursor(&self) -> Result<RecordCursor<'_>, StoreError>;

  /// Replace the entire contents. Duplicate ids keep the last record.
  fn replace_all(&self, records: Vec<PointRecord>) -> Result<(), StoreError>;

  /// Number of stored records.
  fn len(&self) -> Result<usize, StoreError> {
    let mut count = 0;
    for record in self.open_cursor()? {
      record?;
      count += 1;
    }
    Ok(count)
  }
}

fn dedupe_by_id(records: Vec<PointRecord>) -> BTreeMap<RecordId, PointRecord> {
  records.into_iter().map(|r| (r.id.clone(), r)).collect()
}

fn poisoned() -> StoreError {
  StoreError::Unavailable("store lock poisoned".to_owned())
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory `PointStore` ordered by id.
#[derive(Debug, Default)]
pub struct MemoryStore {
  records: RwLock<BTreeMap<RecordId, PointRecord>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a store pre-filled with `records`.
  pub fn with_records(records: Vec<PointRecord>) -> Self {
    Self {
      records: RwLock::new(dedupe_by_id(records)),
    }
  }
}

impl PointStore for MemoryStore {
  fn open_cursor(&self) -> Result<RecordCursor<'_>, StoreError> {
    // The cursor reads a consistent copy; later writes do not affect it.
    let snapshot: Vec<PointRecord> = self.records.read().map_err(|_| poisoned())?.values().cloned().collect();
    Ok(Box::new(snapshot.into_iter().map(Ok)))
  }

  fn replace_all(&self, records: Vec<PointRecord>) -> Result<(), StoreError> {
    let next = dedupe_by_id(records);
    *self.records.write().map_err(|_| poisoned())? = next;
    Ok(())
  }

  fn len(&self) -> Result<usize, StoreError> {
    Ok(self.records.read().map_err(|_| poisoned())?.len())
  }
}

// =============================================================================
// JsonFileStore
// =============================================================================

/// File-backed `PointStore`: one JSON record per line, in id order.
///
/// Reads stream the file line by line. Writes go to a sibling temp file that
/// is renamed over the original, so readers never see a partial replace.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
  path: PathBuf,
}

impl JsonFileStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl PointStore for JsonFileStore {
  fn open_cursor(&self) -> Result<RecordCursor<'_>, StoreError> {
    let file = match File::open(&self.path) {
      Ok(file) => file,
      // A store that was never written is empty.
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Box::new(std::iter::empty())),
      Err(e) => return Err(e.into()),
    };
    if !file.metadata()?.is_file() {
      return Err(StoreError::Unavailable(format!(
        "{} is not a regular file",
        self.path.display()
      )));
    }
    let mut lines = BufReader::new(file).lines();
    let mut done = false;
    // A bad line is yielded and reading goes on; an I/O error is yielded once and ends the cursor.
    Ok(Box::new(std::iter::from_fn(move || {
      while !done {
        match lines.next()? {
          Ok(line) if line.trim().is_empty() => continue,
          Ok(line) => return Some(serde_json::from_str(&line).map_err(StoreError::from)),
          Err(e) => {
            done = true;
            return Some(Err(e.into()));
          }
        }
      }
      None
    })))
  }

  fn replace_all(&self, records: Vec<PointRecord>) -> Result<(), StoreError> {
    let records = dedupe_by_id(records);
    let tmp = self.path.with_extension("tmp");
    {
      let mut out = BufWriter::new(File::create(&tmp)?);
      for record in records.values() {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
      }
      out.flush()?;
    }
    fs::rename(&tmp, &self.path)?;
    tracing::debug!(path = %self.path.display(), records = records.len(), "replaced store contents");
    Ok(())
  }
}

// =============================================================================
// KeyValueStore
// =============================================================================

/// String key-value persistence (orientation state).
pub trait KeyValueStore: Send + Sync {
  fn get(&self, key: &str) -> Option<String>;
  fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory `KeyValueStore`.
#[derive(Debug, Default)]
pub struct MemoryKeyValue {
  values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValue {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryKeyValue {
  fn get(&self, key: &str) -> Option<String> {
    self.values.lock().ok()?.get(key).cloned()
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    self
      .values
      .lock()
      .map_err(|_| poisoned())?
      .insert(key.to_owned(), value.to_owned());
    Ok(())
  }
}

/// `KeyValueStore` persisted as a flat JSON object file.
#[derive(Debug)]
pub struct JsonFileKeyValue {
  path: PathBuf,
  // Serializes read-modify-write cycles within this process.
  guard: Mutex<()>,
}

impl JsonFileKeyValue {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      guard: Mutex::new(()),
    }
  }

  fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
    match fs::read_to_string(&self.path) {
      Ok(text) => Ok(serde_json::from_str(&text)?),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
      Err(e) => Err(e.into()),
    }
  }
}

impl KeyValueStore for JsonFileKeyValue {
  fn get(&self, key: &str) -> Option<String> {
    match self.read_all() {
      Ok(mut values) => values.remove(key),
      Err(e) => {
        tracing::warn!(path = %self.path.display(), error = %e, "unreadable key-value file");
        None
      }
    }
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let _guard = self.guard.lock().map_err(|_| poisoned())?;
    // A corrupt file is replaced rather than blocking every later write.
    let mut values = self.read_all().unwrap_or_default();
    values.insert(key.to_owned(), value.to_owned());
    let tmp = self.path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(&values)?)?;
    fs::rename(&tmp, &self.path)?;
    Ok(())
  }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;
