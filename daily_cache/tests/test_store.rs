use chrono::{Local, NaiveDate};
use daily_cache::{CacheError, CacheKey, DailyCache, RetryPolicy};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Report {
    country: String,
    values: Vec<f64>,
}

#[derive(Debug)]
enum FetchError {
    Cache(CacheError),
    Upstream(String),
}

impl From<CacheError> for FetchError {
    fn from(err: CacheError) -> Self {
        FetchError::Cache(err)
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn report() -> Report {
    Report {
        country: "US".to_string(),
        values: vec![1.5, 2.5, 3.5],
    }
}

fn gdp_key() -> CacheKey {
    CacheKey::compose("MacroData", ["US", "gdp", "2000", "2020"]).unwrap()
}

#[test]
fn test_same_day_computes_once() {
    let dir = tempdir().unwrap();
    let cache = DailyCache::new(dir.path()).unwrap();
    let calls = Cell::new(0);
    let compute = || {
        calls.set(calls.get() + 1);
        Ok::<_, CacheError>(report())
    };

    let first = cache.get_or_compute(&gdp_key(), day(2024, 3, 15), compute).unwrap();
    let second = cache.get_or_compute(&gdp_key(), day(2024, 3, 15), compute).unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(first, report());
    assert_eq!(second, report());
}

#[test]
fn test_later_day_recomputes() {
    let dir = tempdir().unwrap();
    let cache = DailyCache::new(dir.path()).unwrap();
    let calls = Cell::new(0);
    let compute = || {
        calls.set(calls.get() + 1);
        Ok::<_, CacheError>(calls.get())
    };

    let monday: usize = cache.get_or_compute(&gdp_key(), day(2024, 3, 11), compute).unwrap();
    let tuesday: usize = cache.get_or_compute(&gdp_key(), day(2024, 3, 12), compute).unwrap();

    assert_eq!((monday, tuesday), (1, 2));
    assert!(cache.contains(&gdp_key(), day(2024, 3, 11)));
    assert!(cache.contains(&gdp_key(), day(2024, 3, 12)));
}

#[test]
fn test_entry_layout_on_disk() {
    let dir = tempdir().unwrap();
    let cache = DailyCache::new(dir.path()).unwrap();
    let path = cache.put(&gdp_key(), day(2024, 3, 15), &report()).unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "MacroData-US_gdp_2000_2020_20240315.json"
    );

    let stored: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(stored["key"], "MacroData-US_gdp_2000_2020");
    assert_eq!(stored["fetch_date"], "2024-03-15");
    assert_eq!(stored["payload"]["country"], "US");

    // nothing but the promoted entry is left behind
    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["MacroData-US_gdp_2000_2020_20240315.json".to_string()]);
}

#[test]
fn test_get_before_and_after_put() {
    let dir = tempdir().unwrap();
    let cache = DailyCache::new(dir.path().join("nested").join("cache")).unwrap();

    let missing: Option<Report> = cache.get(&gdp_key(), day(2024, 1, 1)).unwrap();
    assert_eq!(missing, None);

    cache.put(&gdp_key(), day(2024, 1, 1), &report()).unwrap();
    let found: Option<Report> = cache.get(&gdp_key(), day(2024, 1, 1)).unwrap();
    assert_eq!(found, Some(report()));
}

#[test]
fn test_failed_compute_is_not_stored() {
    let dir = tempdir().unwrap();
    let cache = DailyCache::new(dir.path()).unwrap();

    let result: Result<Report, FetchError> = cache.get_or_compute(&gdp_key(), day(2024, 5, 1), || {
        Err(FetchError::Upstream("rate limited".to_string()))
    });
    assert!(matches!(result, Err(FetchError::Upstream(_))));
    assert!(!cache.contains(&gdp_key(), day(2024, 5, 1)));

    let recovered: Result<Report, FetchError> =
        cache.get_or_compute(&gdp_key(), day(2024, 5, 1), || Ok(report()));
    assert_eq!(recovered.unwrap(), report());
}

#[test]
fn test_mislabelled_entry_is_reported() {
    let dir = tempdir().unwrap();
    let cache = DailyCache::new(dir.path()).unwrap();
    let other = CacheKey::new("MacroData-FR_cpi_2000_2020").unwrap();

    let written = cache.put(&other, day(2024, 2, 2), &report()).unwrap();
    fs::rename(&written, cache.entry_path(&gdp_key(), day(2024, 2, 2))).unwrap();

    let result: Result<Option<Report>, CacheError> = cache.get(&gdp_key(), day(2024, 2, 2));
    assert!(matches!(result, Err(CacheError::KeyMismatch { .. })));
}

#[test]
fn test_concurrent_callers_see_complete_entries() {
    let dir = tempdir().unwrap();
    let cache = DailyCache::new(dir.path()).unwrap();
    let key = gdp_key();
    let calls = AtomicUsize::new(0);
    let payload: Vec<f64> = (0..5_000).map(|i| i as f64 * 0.5).collect();

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let got: Vec<f64> = cache
                    .get_or_compute(&key, day(2024, 6, 1), || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, CacheError>(payload.clone())
                    })
                    .unwrap();
                assert_eq!(got, payload);
            });
        }
    });

    let computed = calls.load(Ordering::SeqCst);
    assert!((1..=8).contains(&computed));

    let stored: Option<Vec<f64>> = cache.get(&key, day(2024, 6, 1)).unwrap();
    assert_eq!(stored, Some(payload));

    // later callers on the same day never compute
    let again: Vec<f64> = cache
        .get_or_compute(&key, day(2024, 6, 1), || -> Result<Vec<f64>, CacheError> {
            panic!("entry should be served from disk")
        })
        .unwrap();
    assert_eq!(again.len(), 5_000);
}

#[test]
fn test_today_uses_local_calendar_day() {
    let dir = tempdir().unwrap();
    let cache = DailyCache::new(dir.path()).unwrap();
    let key = CacheKey::new("StockData-AAPL_daily").unwrap();

    let value: u32 = cache.get_or_compute_today(&key, || Ok::<_, CacheError>(7)).unwrap();
    assert_eq!(value, 7);

    let today = Local::now().date_naive();
    // tolerate the test straddling midnight
    let yesterday = today.pred_opt().unwrap();
    assert!(cache.contains(&key, today) || cache.contains(&key, yesterday));
}

#[test]
fn test_retry_policy_wraps_flaky_fetch() {
    let dir = tempdir().unwrap();
    let cache = DailyCache::new(dir.path()).unwrap();
    let policy = RetryPolicy::none();
    let attempts = Cell::new(0);
    let retrying = RetryPolicy {
        max_attempts: 3,
        ..policy
    };

    let value: Result<Report, FetchError> = cache.get_or_compute(&gdp_key(), day(2024, 7, 1), || {
        retrying.run_with(
            || {
                attempts.set(attempts.get() + 1);
                if attempts.get() < 3 {
                    Err(FetchError::Upstream("timeout".to_string()))
                } else {
                    Ok(report())
                }
            },
            |_| {},
        )
    });

    assert_eq!(value.unwrap(), report());
    assert_eq!(attempts.get(), 3);
}
