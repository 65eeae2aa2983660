use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Key/value string storage persisted as a single JSON file
///
/// Mirrors browser local storage: values are opaque strings, and every
/// write rewrites the whole file synchronously.
#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    /// Open storage backed by `path`, starting empty if the file is missing or unreadable
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable local storage {:?}: {}", path, e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read local storage {:?}: {}", path, e);
                BTreeMap::new()
            }
        };

        Self { path, entries }
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: String) -> io::Result<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn flush(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string(&self.entries)?;
        fs::write(&self.path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");

        let mut storage = LocalStorage::open(&path);
        assert_eq!(storage.get_item("expenses"), None);
        storage.set_item("expenses", "[]".to_string()).unwrap();
        storage.set_item("theme", "dark".to_string()).unwrap();
        storage.set_item("theme", "light".to_string()).unwrap();

        let reopened = LocalStorage::open(&path);
        assert_eq!(reopened.get_item("expenses"), Some("[]"));
        assert_eq!(reopened.get_item("theme"), Some("light"));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, "{not json").unwrap();

        let storage = LocalStorage::open(&path);
        assert_eq!(storage.get_item("expenses"), None);
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("storage.json");

        let mut storage = LocalStorage::open(&path);
        storage.set_item("k", "v".to_string()).unwrap();
        assert!(path.exists());
    }
}
