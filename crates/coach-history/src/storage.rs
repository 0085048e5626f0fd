//! Named key/value slots backing the history store.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::HistoryError;

/// A string-valued key/value store
pub trait SlotStorage: Send + Sync {
    /// Read a slot; `Ok(None)` when it has never been written
    fn read(&self, key: &str) -> Result<Option<String>, HistoryError>;

    /// Replace the whole contents of a slot
    fn write(&self, key: &str, value: &str) -> Result<(), HistoryError>;
}

/// One `<key>.json` file per slot in a directory.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the slot, so a reader never sees a partially written document.
pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    /// Slots under `<data_dir>/interview-coach/`
    pub fn new() -> Result<Self, HistoryError> {
        let data_dir = dirs::data_dir().ok_or(HistoryError::NoDataDir)?;
        Ok(Self::with_dir(data_dir.join("interview-coach")))
    }

    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SlotStorage for FileSlots {
    fn read(&self, key: &str) -> Result<Option<String>, HistoryError> {
        let path = self.slot_path(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HistoryError::io(path, e)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), HistoryError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| HistoryError::io(&self.dir, e))?;

        let path = self.slot_path(key);
        let tmp_path = self.dir.join(format!(".{}.json.tmp", key));

        let mut file =
            std::fs::File::create(&tmp_path).map_err(|e| HistoryError::io(&tmp_path, e))?;
        file.write_all(value.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| HistoryError::io(&tmp_path, e))?;
        drop(file);

        std::fs::rename(&tmp_path, &path).map_err(|e| HistoryError::io(&path, e))?;
        tracing::debug!(path = ?path, bytes = value.len(), "Wrote history slot");
        Ok(())
    }
}

/// In-memory slots
#[derive(Default)]
pub struct MemorySlots {
    slots: Mutex<HashMap<String, String>>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a slot with raw contents
    pub fn with_slot(self, key: &str, value: &str) -> Self {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), value.to_string());
        }
        self
    }
}

impl SlotStorage for MemorySlots {
    fn read(&self, key: &str) -> Result<Option<String>, HistoryError> {
        Ok(self
            .slots
            .lock()
            .ok()
            .and_then(|slots| slots.get(key).cloned()))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), HistoryError> {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_slot_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let slots = FileSlots::with_dir(dir.path().join("nested"));
        assert!(slots.read("anything").unwrap().is_none());
    }

    #[test]
    fn test_file_slot_write_creates_dir_and_replaces() {
        let dir = TempDir::new().unwrap();
        let slots = FileSlots::with_dir(dir.path().join("nested"));

        slots.write("key", "first").unwrap();
        slots.write("key", "second").unwrap();

        assert_eq!(slots.read("key").unwrap().as_deref(), Some("second"));
        assert!(!dir.path().join("nested").join(".key.json.tmp").exists());
    }

    #[test]
    fn test_memory_slots() {
        let slots = MemorySlots::new().with_slot("a", "1");
        assert_eq!(slots.read("a").unwrap().as_deref(), Some("1"));
        slots.write("a", "2").unwrap();
        assert_eq!(slots.read("a").unwrap().as_deref(), Some("2"));
        assert!(slots.read("b").unwrap().is_none());
    }
}
