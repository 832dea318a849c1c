//! File-backed JSON record
//!
//! One record is one JSON object in one file, guarded by its own mutex. Every
//! access re-reads the file and merges in the defaults, so the file on disk is
//! always the source of truth:
//! - missing file: created from the defaults
//! - unreadable or malformed file: treated as empty and rebuilt from the defaults
//! - missing keys: backfilled and the file rewritten
//! - unknown keys: kept as they are

use crate::error::{LedgerError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub(crate) type Object = Map<String, Value>;

/// Outcome of a mutation closure: whether the record must be written back.
pub(crate) enum Change<T> {
    Write(T),
    Skip(T),
}

#[derive(Debug)]
pub(crate) struct JsonRecord {
    path: PathBuf,
    defaults: Object,
    lock: Mutex<()>,
}

impl JsonRecord {
    /// Open the record, creating or repairing the file as needed.
    pub fn open(path: PathBuf, defaults: Object) -> Result<Self> {
        let record = Self {
            path,
            defaults,
            lock: Mutex::new(()),
        };
        record.read()?;
        Ok(record)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn defaults(&self) -> &Object {
        &self.defaults
    }

    /// Current contents, with defaults merged in.
    pub fn read(&self) -> Result<Object> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load_unlocked()
    }

    /// Read-modify-write under this record's lock.
    pub fn update<T>(&self, f: impl FnOnce(&mut Object) -> Change<T>) -> Result<T> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut data = self.load_unlocked()?;
        match f(&mut data) {
            Change::Write(out) => {
                self.save_unlocked(&data)?;
                Ok(out)
            }
            Change::Skip(out) => Ok(out),
        }
    }

    fn load_unlocked(&self) -> Result<Object> {
        let (mut data, mut dirty) = match fs::read_to_string(&self.path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => (map, false),
                Ok(_) | Err(_) => {
                    tracing::warn!(path = %self.path.display(), "malformed ledger file, rebuilding from defaults");
                    (Object::new(), true)
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => (Object::new(), true),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unreadable ledger file, rebuilding from defaults");
                (Object::new(), true)
            }
        };

        for (key, value) in &self.defaults {
            if !data.contains_key(key) {
                data.insert(key.clone(), value.clone());
                dirty = true;
            }
        }

        if dirty {
            self.save_unlocked(&data)?;
        }
        Ok(data)
    }

    fn save_unlocked(&self, data: &Object) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| LedgerError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let text = serde_json::to_string_pretty(data).map_err(|source| LedgerError::Encode {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, text).map_err(|source| LedgerError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> Object {
        match json!({ "a": 1, "b": "x" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn on_disk(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_missing_file_created_with_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("rec.json");
        let record = JsonRecord::open(path.clone(), defaults()).unwrap();

        assert_eq!(on_disk(&path), json!({ "a": 1, "b": "x" }));
        assert_eq!(record.read().unwrap(), defaults());
    }

    #[test]
    fn test_malformed_file_rebuilt() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rec.json");
        fs::write(&path, "{ not json").unwrap();

        JsonRecord::open(path.clone(), defaults()).unwrap();
        assert_eq!(on_disk(&path), json!({ "a": 1, "b": "x" }));
    }

    #[test]
    fn test_non_object_file_rebuilt() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rec.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        JsonRecord::open(path.clone(), defaults()).unwrap();
        assert_eq!(on_disk(&path), json!({ "a": 1, "b": "x" }));
    }

    #[test]
    fn test_backfill_keeps_existing_and_unknown_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rec.json");
        fs::write(&path, r#"{ "a": 7, "extra": true }"#).unwrap();

        JsonRecord::open(path.clone(), defaults()).unwrap();
        assert_eq!(on_disk(&path), json!({ "a": 7, "extra": true, "b": "x" }));
    }

    #[test]
    fn test_skip_does_not_write() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rec.json");
        let record = JsonRecord::open(path.clone(), defaults()).unwrap();

        record
            .update(|data| {
                data.insert("a".into(), json!(99));
                Change::Skip(())
            })
            .unwrap();
        assert_eq!(on_disk(&path)["a"], json!(1));

        record
            .update(|data| {
                data.insert("a".into(), json!(99));
                Change::Write(())
            })
            .unwrap();
        assert_eq!(on_disk(&path)["a"], json!(99));
    }
}
