use super::local::KvBackend;
use super::Slot;
use crate::error::{InsightError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File-based key-value backend: each key lives in `<root>/<key>.json`.
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(InsightError::Io)?;
        }
        Ok(())
    }
}

impl KvBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(InsightError::Io)?;
        Ok(Some(content))
    }

    /// Writes to a temp file then renames, so a crash never leaves half a slot.
    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.ensure_dir()?;
        let path = self.key_path(key);
        let tmp = self.root.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value).map_err(InsightError::Io)?;
        fs::rename(&tmp, &path).map_err(InsightError::Io)?;
        Ok(())
    }

    /// Removes the slot files only; other files sharing the directory stay.
    fn clear(&mut self) -> Result<()> {
        for slot in Slot::ALL {
            let path = self.key_path(slot.key());
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(InsightError::Io(e)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path().join("local"));
        assert_eq!(backend.read("nothing").unwrap(), None);
    }

    #[test]
    fn write_creates_directory_and_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("local");
        let mut backend = FileBackend::new(&root);
        backend.write("solo_insight_tags", "[\"a\"]").unwrap();

        assert!(root.join("solo_insight_tags.json").exists());
        assert!(!root.join(".solo_insight_tags.json.tmp").exists());
        assert_eq!(
            backend.read("solo_insight_tags").unwrap().as_deref(),
            Some("[\"a\"]")
        );
    }

    #[test]
    fn clear_removes_slot_files() {
        let dir = TempDir::new().unwrap();
        let mut backend = FileBackend::new(dir.path());
        backend.write(Slot::Entries.key(), "[]").unwrap();
        backend.write(Slot::Tags.key(), "[\"a\"]").unwrap();
        backend.clear().unwrap();
        assert_eq!(backend.read(Slot::Entries.key()).unwrap(), None);
        assert_eq!(backend.read(Slot::Tags.key()).unwrap(), None);
    }

    #[test]
    fn clear_keeps_unrelated_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.json"), "{}").unwrap();
        fs::write(dir.path().join("session.json"), "{\"user\":\"amy\"}").unwrap();
        let mut backend = FileBackend::new(dir.path());
        backend.write(Slot::Library.key(), "[]").unwrap();

        backend.clear().unwrap();
        assert_eq!(backend.read(Slot::Library.key()).unwrap(), None);
        assert!(dir.path().join("config.json").exists());
        assert!(dir.path().join("session.json").exists());
    }

    #[test]
    fn clear_on_missing_directory_is_ok() {
        let dir = TempDir::new().unwrap();
        let mut backend = FileBackend::new(dir.path().join("never-written"));
        backend.clear().unwrap();
    }
}
