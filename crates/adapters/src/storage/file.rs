//! File-backed key/value store: one file per key under a directory.

use idconsole_ports::KeyValueStorePort;
use idconsole_shared::{ErrorCode, ErrorEnvelope, Result};
use std::io;
use std::path::{Path, PathBuf};

/// Durable store writing `<dir>/<key>.json`.
///
/// Keys are restricted to `[a-z0-9-]` so they map to file names verbatim.
/// Writes go to a sibling temp file and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Create a store rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-');
        if !valid {
            return Err(ErrorEnvelope::expected(
                ErrorCode::new("storage", "invalid_key"),
                "storage keys must match [a-z0-9-]+",
            )
            .with_metadata("key", key));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorePort for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(io_error(error, &path)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|error| io_error(error, &self.dir))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|error| io_error(error, &tmp))?;
        std::fs::rename(&tmp, &path).map_err(|error| io_error(error, &path))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(error, &path)),
        }
    }
}

fn io_error(error: io::Error, path: &Path) -> ErrorEnvelope {
    ErrorEnvelope::from(error).with_metadata("path", path.display().to_string())
}
