//! On-disk store keyed by logical key and fetch day

use crate::error::{CacheError, Result};
use crate::key::CacheKey;
use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Entry as written to disk
#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    key: &'a str,
    fetch_date: NaiveDate,
    payload: &'a T,
}

/// Entry as read back from disk
#[derive(Deserialize)]
struct Envelope<T> {
    key: String,
    fetch_date: NaiveDate,
    payload: T,
}

/// Compute-once-per-day cache stored as one JSON file per identity.
///
/// An entry for `(key, fetch_date)` lives at
/// `{root}/{key}_{YYYYMMDD}.json`. Entries are written to a temporary file
/// in the same directory and renamed into place, so a reader sees either
/// the complete entry or nothing. Old days are never cleaned up here.
#[derive(Debug, Clone)]
pub struct DailyCache {
    root: PathBuf,
}

impl DailyCache {
    /// Open a cache rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the entry for `key` on `fetch_date`
    pub fn entry_path(&self, key: &CacheKey, fetch_date: NaiveDate) -> PathBuf {
        self.root.join(format!("{}.json", key.identity(fetch_date)))
    }

    pub fn contains(&self, key: &CacheKey, fetch_date: NaiveDate) -> bool {
        self.entry_path(key, fetch_date).is_file()
    }

    /// Payload stored for `key` on `fetch_date`, if any
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey, fetch_date: NaiveDate) -> Result<Option<T>> {
        let path = self.entry_path(key, fetch_date);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let envelope: Envelope<T> = serde_json::from_reader(BufReader::new(file))?;
        if envelope.key != key.as_str() || envelope.fetch_date != fetch_date {
            return Err(CacheError::KeyMismatch {
                path,
                expected: key.identity(fetch_date),
                found: format!("{}_{}", envelope.key, envelope.fetch_date.format("%Y%m%d")),
            });
        }

        Ok(Some(envelope.payload))
    }

    /// Atomically write `payload` as the entry for `key` on `fetch_date`,
    /// replacing any existing entry.
    pub fn put<T: Serialize>(&self, key: &CacheKey, fetch_date: NaiveDate, payload: &T) -> Result<PathBuf> {
        let path = self.entry_path(key, fetch_date);
        let envelope = EnvelopeRef {
            key: key.as_str(),
            fetch_date,
            payload,
        };

        let mut staged = tempfile::Builder::new()
            .prefix(".tmp-")
            .suffix(".partial")
            .tempfile_in(&self.root)?;
        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            serde_json::to_writer(&mut writer, &envelope)?;
            writer.flush()?;
        }
        staged.as_file().sync_all()?;
        staged.persist(&path)?;

        tracing::debug!(path = %path.display(), "promoted cache entry");
        Ok(path)
    }

    /// Return the entry for `key` on `fetch_date`, running `compute` and
    /// storing its result only when there is none.
    ///
    /// Errors from `compute` are returned unchanged and nothing is stored.
    /// Two callers racing on the same identity may both compute; the last
    /// complete write wins.
    pub fn get_or_compute<T, E, F>(&self, key: &CacheKey, fetch_date: NaiveDate, compute: F) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        if let Some(payload) = self.get(key, fetch_date)? {
            tracing::debug!(identity = %key.identity(fetch_date), "cache hit");
            return Ok(payload);
        }

        tracing::debug!(identity = %key.identity(fetch_date), "cache miss");
        let payload = compute()?;
        self.put(key, fetch_date, &payload)?;
        Ok(payload)
    }

    /// [`DailyCache::get_or_compute`] for the local calendar day
    pub fn get_or_compute_today<T, E, F>(&self, key: &CacheKey, compute: F) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        self.get_or_compute(key, Local::now().date_naive(), compute)
    }
}
