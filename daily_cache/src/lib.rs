//! # Daily Cache
//!
//! Memoises expensive fetch-and-compute pipelines once per calendar day.
//!
//! A query is identified by a [`CacheKey`]; together with the fetch day it
//! forms the entry identity `{key}_{YYYYMMDD}`. The same query on the same
//! day is served from disk, the same query on a later day is recomputed.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use daily_cache::{CacheError, CacheKey, DailyCache};
//!
//! let dir = tempfile::tempdir()?;
//! let cache = DailyCache::new(dir.path())?;
//! let key = CacheKey::compose("MacroData", ["US", "gdp", "2000", "2020"])?;
//! let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//!
//! let first: Vec<f64> = cache.get_or_compute(&key, day, || Ok::<_, CacheError>(vec![1.0, 2.0]))?;
//! let again: Vec<f64> = cache.get_or_compute(&key, day, || -> Result<Vec<f64>, CacheError> {
//!     unreachable!("served from disk")
//! })?;
//! assert_eq!(first, again);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod key;
pub mod retry;
pub mod store;

pub use crate::error::{CacheError, Result};
pub use crate::key::CacheKey;
pub use crate::retry::RetryPolicy;
pub use crate::store::DailyCache;
