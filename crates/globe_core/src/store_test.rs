use std::path::PathBuf;

use super::*;

fn scratch(name: &str) -> PathBuf {
  let dir = std::env::temp_dir().join(format!("globe_core_store_{}_{name}", std::process::id()));
  let _ = fs::remove_dir_all(&dir);
  fs::create_dir_all(&dir).unwrap();
  dir
}

fn records() -> Vec<PointRecord> {
  vec![
    PointRecord::new(3, 0.3, -0.3),
    PointRecord::new(1, 0.1, -0.1),
    PointRecord::new("b", 0.5, 0.5),
    PointRecord::new(2, 0.2, -0.2),
  ]
}

fn ids(store: &dyn PointStore) -> Vec<RecordId> {
  store.open_cursor().unwrap().map(|r| r.unwrap().id).collect()
}

#[test]
fn test_record_id_parses_numbers_and_strings() {
  let n: PointRecord = serde_json::from_str(r#"{"id": 7, "x": 0.0, "y": 1.0}"#).unwrap();
  let s: PointRecord = serde_json::from_str(r#"{"id": "p7", "x": 0.0, "y": 1.0}"#).unwrap();
  assert_eq!(n.id, RecordId::Int(7));
  assert_eq!(s.id, RecordId::Text("p7".into()));
  assert!(RecordId::Int(i64::MAX) < RecordId::Text(String::new()));
}

#[test]
fn test_memory_store_cursor_in_key_order() {
  let store = MemoryStore::with_records(records());
  assert_eq!(
    ids(&store),
    vec![RecordId::Int(1), RecordId::Int(2), RecordId::Int(3), RecordId::from("b")]
  );
  assert_eq!(store.len().unwrap(), 4);
}

#[test]
fn test_memory_store_replace_all_last_duplicate_wins() {
  let store = MemoryStore::with_records(records());
  store
    .replace_all(vec![PointRecord::new(1, 0.0, 0.0), PointRecord::new(1, 0.9, 0.9)])
    .unwrap();
  let all: Vec<PointRecord> = store.open_cursor().unwrap().map(Result::unwrap).collect();
  assert_eq!(all, vec![PointRecord::new(1, 0.9, 0.9)]);
}

#[test]
fn test_memory_cursor_unaffected_by_later_writes() {
  let store = MemoryStore::with_records(records());
  let cursor = store.open_cursor().unwrap();
  store.replace_all(Vec::new()).unwrap();
  assert_eq!(cursor.count(), 4);
  assert_eq!(store.len().unwrap(), 0);
}

#[test]
fn test_file_store_missing_file_is_empty() {
  let dir = scratch("missing");
  let store = JsonFileStore::new(dir.join("points.jsonl"));
  assert_eq!(store.len().unwrap(), 0);
}

#[test]
fn test_file_store_round_trip() {
  let dir = scratch("round_trip");
  let store = JsonFileStore::new(dir.join("points.jsonl"));
  store.replace_all(records()).unwrap();

  assert_eq!(ids(&store).len(), 4);
  assert_eq!(ids(&store)[0], RecordId::Int(1));
  assert!(!dir.join("points.tmp").exists(), "temp file renamed away");

  store.replace_all(vec![PointRecord::new(9, 0.0, 0.0)]).unwrap();
  assert_eq!(ids(&store), vec![RecordId::Int(9)]);
}

#[test]
fn test_file_store_reports_corrupt_line() {
  let dir = scratch("corrupt");
  let path = dir.join("points.jsonl");
  fs::write(&path, "{\"id\":1,\"x\":0.0,\"y\":0.0}\nnot json\n").unwrap();
  let store = JsonFileStore::new(&path);
  let items: Vec<_> = store.open_cursor().unwrap().collect();
  assert_eq!(items.len(), 2);
  assert!(items[0].is_ok());
  assert!(matches!(items[1], Err(StoreError::Json(_))));
  assert!(store.len().is_err());
}

#[test]
fn test_file_store_rejects_directory() {
  let dir = scratch("dir_store");
  let store = JsonFileStore::new(&dir);
  assert!(matches!(store.open_cursor(), Err(StoreError::Unavailable(_))));
  assert!(store.len().is_err());
}

#[test]
fn test_memory_key_value() {
  let kv = MemoryKeyValue::new();
  assert_eq!(kv.get("zoomScale"), None);
  kv.set("zoomScale", "2").unwrap();
  assert_eq!(kv.get("zoomScale").as_deref(), Some("2"));
}

#[test]
fn test_file_key_value_persists_across_instances() {
  let dir = scratch("kv");
  let path = dir.join("state.json");
  {
    let kv = JsonFileKeyValue::new(&path);
    kv.set("zoomScale", "1.5").unwrap();
    kv.set("rotation", "0.1,0.2").unwrap();
  }
  let kv = JsonFileKeyValue::new(&path);
  assert_eq!(kv.get("zoomScale").as_deref(), Some("1.5"));
  assert_eq!(kv.get("rotation").as_deref(), Some("0.1,0.2"));
  assert_eq!(kv.get("missing"), None);
}

#[test]
fn test_file_key_value_recovers_from_corrupt_file() {
  let dir = scratch("kv_corrupt");
  let path = dir.join("state.json");
  fs::write(&path, "{oops").unwrap();
  let kv = JsonFileKeyValue::new(&path);
  assert_eq!(kv.get("zoomScale"), None);
  kv.set("zoomScale", "2").unwrap();
  assert_eq!(kv.get("zoomScale").as_deref(), Some("2"));
}
