//! File-backed snapshot cache.
//!
//! Fetching the raw tables is slow, so the pipeline keeps a copy of each
//! table on disk. A cached snapshot is served while it is younger than the
//! configured timeout. Once it is stale it is moved to the archive directory
//! (prefixed with the archiving date, `DD_MM_YYYY_<name>.csv`) and the caller
//! is told it is not there, which makes it refetch.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Local;

use crate::error::MortalityError;
use crate::io::snapshot::Snapshot;

pub trait SnapshotCache {
    /// Store `snapshot` under `name`, replacing any previous copy.
    fn put<T: Snapshot>(&self, name: &str, snapshot: &T) -> Result<(), MortalityError>;

    /// `Some` for a fresh snapshot; `None` when absent or stale.
    fn get<T: Snapshot>(&self, name: &str) -> Result<Option<T>, MortalityError>;
}

#[derive(Debug, Clone)]
pub struct FileSnapshotCache {
    data_dir: PathBuf,
    archive_dir: PathBuf,
    timeout: Duration,
    extension: String,
}

impl FileSnapshotCache {
    pub fn new(data_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            data_dir: data_dir.into(),
            archive_dir: archive_dir.into(),
            timeout,
            extension: "csv".to_string(),
        }
    }

    pub fn with_timeout_hours(
        data_dir: impl Into<PathBuf>,
        archive_dir: impl Into<PathBuf>,
        hours: f64,
    ) -> Result<Self, MortalityError> {
        let timeout = Duration::try_from_secs_f64(hours * 3600.0).map_err(|_| MortalityError::Cache {
            message: format!("invalid cache timeout of {hours} hours"),
        })?;
        Ok(Self::new(data_dir, archive_dir, timeout))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, MortalityError> {
        let valid = !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\']);
        if !valid {
            return Err(MortalityError::Cache {
                message: format!("invalid snapshot name '{name}'"),
            });
        }
        Ok(self.data_dir.join(format!("{name}.{}", self.extension)))
    }

    fn is_stale(&self, path: &Path) -> Result<bool, MortalityError> {
        let modified = fs::metadata(path)?.modified()?;
        let age = SystemTime::now().duration_since(modified).unwrap_or(Duration::ZERO);
        Ok(age >= self.timeout)
    }

    fn archive(&self, name: &str, path: &Path) -> Result<PathBuf, MortalityError> {
        fs::create_dir_all(&self.archive_dir)?;
        let stamp = Local::now().format("%d_%m_%Y");
        let target = self.archive_dir.join(format!("{stamp}_{name}.{}", self.extension));
        fs::rename(path, &target)?;
        Ok(target)
    }
}

impl SnapshotCache for FileSnapshotCache {
    fn put<T: Snapshot>(&self, name: &str, snapshot: &T) -> Result<(), MortalityError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.data_dir)?;
        let file = File::create(&path)?;
        snapshot.write_snapshot(BufWriter::new(file))?;
        log::info!("cached {name} at {}", path.display());
        Ok(())
    }

    fn get<T: Snapshot>(&self, name: &str) -> Result<Option<T>, MortalityError> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            log::info!("cache miss for {name}");
            return Ok(None);
        }

        if self.is_stale(&path)? {
            let archived = self.archive(name, &path)?;
            log::info!("cached {name} timed out; archived to {}", archived.display());
            return Ok(None);
        }

        let file = File::open(&path)?;
        let snapshot = T::read_snapshot(BufReader::new(file))?;
        log::info!("cache hit for {name}");
        Ok(Some(snapshot))
    }
}
