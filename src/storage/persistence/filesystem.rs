//! Filesystem snapshot store.
//!
//! Keeps the whole registry in one pretty-printed JSON document:
//!
//! ```json
//! {
//!   "products": [{ "id": "p-1", "name": "Headphones", "price": 59.9 }],
//!   "users": [{ "id": "u-admin", "email": "admin@storefront.local" }]
//! }
//! ```
//!
//! Writes go to a sibling temp file which is synced and then renamed over
//! the snapshot, so a crash mid-write leaves the previous snapshot intact.
//! Both reads and writes are capped at [`MAX_SNAPSHOT_SIZE`] (or the limit
//! given to [`FileSnapshotStore::with_max_size`]). A snapshot that grows past
//! the cap is refused before the file is touched, so the last snapshot that
//! fit stays loadable.

use crate::storage::Snapshot;
use crate::storage::traits::{PARSE_SNAPSHOT_OPERATION, SnapshotStore};
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Maximum snapshot size (64 MiB).
/// Prevents memory exhaustion from a runaway or foreign file.
pub const MAX_SNAPSHOT_SIZE: u64 = 64 * 1024 * 1024;

/// Default snapshot file name inside the data directory.
pub const DEFAULT_SNAPSHOT_FILE: &str = "store.json";

/// Suffix appended to a snapshot that is moved aside.
pub const SET_ASIDE_SUFFIX: &str = ".corrupt";

/// Snapshot store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
    max_size: u64,
}

impl FileSnapshotStore {
    /// Creates a store for the snapshot at `path`.
    ///
    /// Nothing is touched on disk until the first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size: MAX_SNAPSHOT_SIZE,
        }
    }

    /// Creates a store for `file_name` inside `data_dir`.
    pub fn in_dir(data_dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self::new(data_dir.as_ref().join(file_name))
    }

    /// Creates a store for `file_name` inside `data_dir`, creating the
    /// directory first.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_create(data_dir: impl AsRef<Path>, file_name: &str) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).map_err(|e| Error::PersistenceFailure {
            operation: "create_data_dir".to_string(),
            cause: format!("{}: {e}", data_dir.display()),
        })?;
        Ok(Self::in_dir(data_dir, file_name))
    }

    /// Sets the largest snapshot, in bytes, this store will read or write.
    #[must_use]
    pub const fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Returns the snapshot path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the size cap in bytes.
    #[must_use]
    pub const fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Returns where [`SnapshotStore::set_aside`] moves the snapshot.
    #[must_use]
    pub fn set_aside_path(&self) -> PathBuf {
        self.sibling(SET_ASIDE_SUFFIX)
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn write_temp(temp: &Path, json: &str) -> Result<()> {
        let write_error = |e: std::io::Error| Error::PersistenceFailure {
            operation: "write_snapshot".to_string(),
            cause: format!("{}: {e}", temp.display()),
        };

        let mut file = File::create(temp).map_err(write_error)?;
        file.write_all(json.as_bytes()).map_err(write_error)?;
        file.sync_all().map_err(|e| Error::PersistenceFailure {
            operation: "sync_snapshot".to_string(),
            cause: format!("{}: {e}", temp.display()),
        })
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let metadata = fs::metadata(&self.path).map_err(|e| Error::PersistenceFailure {
            operation: "read_snapshot_metadata".to_string(),
            cause: e.to_string(),
        })?;

        if metadata.len() > self.max_size {
            return Err(Error::PersistenceFailure {
                operation: "read_snapshot".to_string(),
                cause: format!(
                    "snapshot of {} bytes exceeds maximum size of {} bytes: {}",
                    metadata.len(),
                    self.max_size,
                    self.path.display()
                ),
            });
        }

        let json = fs::read_to_string(&self.path).map_err(|e| Error::PersistenceFailure {
            operation: "read_snapshot".to_string(),
            cause: e.to_string(),
        })?;

        let snapshot: Snapshot =
            serde_json::from_str(&json).map_err(|e| Error::PersistenceFailure {
                operation: PARSE_SNAPSHOT_OPERATION.to_string(),
                cause: e.to_string(),
            })?;

        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::PersistenceFailure {
                operation: "create_data_dir".to_string(),
                cause: e.to_string(),
            })?;
        }

        let json = serde_json::to_string_pretty(snapshot).map_err(|e| Error::PersistenceFailure {
            operation: "serialize_snapshot".to_string(),
            cause: e.to_string(),
        })?;

        let size = u64::try_from(json.len()).unwrap_or(u64::MAX);
        if size > self.max_size {
            return Err(Error::PersistenceFailure {
                operation: "write_snapshot".to_string(),
                cause: format!(
                    "snapshot of {size} bytes exceeds maximum size of {} bytes: {}",
                    self.max_size,
                    self.path.display()
                ),
            });
        }

        let temp = self.temp_path();
        if let Err(e) = Self::write_temp(&temp, &json) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }

        fs::rename(&temp, &self.path).map_err(|e| Error::PersistenceFailure {
            operation: "replace_snapshot".to_string(),
            cause: format!("{}: {e}", self.path.display()),
        })?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        fs::remove_file(&self.path).map_err(|e| Error::PersistenceFailure {
            operation: "remove_snapshot".to_string(),
            cause: e.to_string(),
        })
    }

    fn set_aside(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let target = self.set_aside_path();
        fs::rename(&self.path, &target).map_err(|e| Error::PersistenceFailure {
            operation: "set_aside_snapshot".to_string(),
            cause: format!("{} -> {}: {e}", self.path.display(), target.display()),
        })?;
        Ok(Some(target.display().to_string()))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
