use super::{KeyValueStore, StorageError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// One `<key>.json` file per key inside a data directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open the store in the OS-standard data directory.
    ///
    /// - Linux: `$XDG_DATA_HOME/smash-night/` or `~/.local/share/smash-night/`
    /// - macOS: `~/Library/Application Support/smash-night/`
    pub fn open_default() -> Result<Self, StorageError> {
        Self::open(Self::data_dir()?)
    }

    pub fn data_dir() -> Result<PathBuf, StorageError> {
        ProjectDirs::from("", "", "smash-night")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(StorageError::NoDataDirectory)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    /// Write to a temp file then rename, so a failed write never truncates the old value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn set_get_remove_roundtrip_on_disk() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path().join("data")).unwrap();
        assert_eq!(store.get("smash_night_data"), None);

        store.set("smash_night_data", "{\"a\":1}").unwrap();
        assert_eq!(store.get("smash_night_data").as_deref(), Some("{\"a\":1}"));
        assert!(dir.path().join("data/smash_night_data.json").exists());

        store.remove("smash_night_data").unwrap();
        assert_eq!(store.get("smash_night_data"), None);
        store.remove("smash_night_data").unwrap();
    }

    #[test]
    fn odd_keys_stay_inside_the_directory() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        store.set("../escape", "x").unwrap();
        assert!(dir.path().join("___escape.json").exists());
    }
}
