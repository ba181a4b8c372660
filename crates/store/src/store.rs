use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::{Clock, DeviceInfo, DeviceRecord, SystemClock};

/// Newline-delimited device log guarded by a single lock.
///
/// Every operation holds the lock for its whole duration, so reads and
/// writes never overlap and appended lines never interleave. There is no
/// in-memory copy: each call goes straight to the file.
pub struct LogStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl LogStore {
    /// Opens the log at `path`, creating an empty file if none exists.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StoreError::open(parent, err))?;
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| StoreError::open(&path, err))?;

        debug!(path = %path.display(), "log store ready");

        Ok(Self {
            path,
            clock,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the full contents of the log. An empty log yields an empty vec.
    pub fn read(&self) -> StoreResult<Vec<u8>> {
        let _guard = self.guard()?;
        fs::read(&self.path).map_err(|err| StoreError::read(&self.path, err))
    }

    /// Stamps and appends a single record.
    pub fn append_one(&self, info: DeviceInfo) -> StoreResult<DeviceRecord> {
        let _guard = self.guard()?;
        let mut file = self.open_append()?;
        self.write_record(&mut file, info)
    }

    /// Stamps and appends each record in order. Lines written before a
    /// failure are kept.
    pub fn append_many(&self, infos: Vec<DeviceInfo>) -> StoreResult<usize> {
        let _guard = self.guard()?;
        let mut file = self.open_append()?;
        self.write_all_records(&mut file, infos)
    }

    /// Truncates the log, then writes each record in order.
    pub fn replace_all(&self, infos: Vec<DeviceInfo>) -> StoreResult<usize> {
        let _guard = self.guard()?;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|err| StoreError::create(&self.path, err))?;
        self.write_all_records(&mut file, infos)
    }

    /// Truncates the log to zero length. The file must still exist.
    pub fn clear(&self) -> StoreResult<()> {
        let _guard = self.guard()?;
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|err| StoreError::truncate(&self.path, err))?;
        file.set_len(0)
            .map_err(|err| StoreError::truncate(&self.path, err))
    }

    fn guard(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| StoreError::Poisoned)
    }

    fn open_append(&self) -> StoreResult<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| StoreError::open(&self.path, err))
    }

    fn write_all_records(&self, file: &mut File, infos: Vec<DeviceInfo>) -> StoreResult<usize> {
        let mut written = 0;
        for info in infos {
            self.write_record(file, info)?;
            written += 1;
        }
        Ok(written)
    }

    // One write per line keeps each line whole.
    fn write_record(&self, file: &mut File, info: DeviceInfo) -> StoreResult<DeviceRecord> {
        let record = DeviceRecord::stamp(info, self.clock.as_ref());
        file.write_all(record.to_line().as_bytes())
            .map_err(|err| StoreError::write(&self.path, err))?;
        Ok(record)
    }
}

impl std::fmt::Debug for LogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStore").field("path", &self.path).finish()
    }
}
