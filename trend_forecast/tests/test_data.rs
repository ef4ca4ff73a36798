use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;
use trend_forecast::{ForecastError, Granularity, HistoricalSeries, Observation, SeriesLoader};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[rstest]
#[case("daily", Granularity::Daily)]
#[case("WEEKLY", Granularity::Weekly)]
#[case(" Monthly ", Granularity::Monthly)]
#[case("quarterly", Granularity::Quarterly)]
#[case("yearly", Granularity::Yearly)]
fn test_granularity_tags(#[case] tag: &str, #[case] expected: Granularity) {
    assert_eq!(tag.parse::<Granularity>().unwrap(), expected);
}

#[rstest]
#[case("hourly")]
#[case("annual")]
#[case("")]
fn test_unknown_granularity_tags(#[case] tag: &str) {
    assert!(matches!(
        tag.parse::<Granularity>(),
        Err(ForecastError::UnsupportedGranularity(_))
    ));
}

#[test]
fn test_series_rejects_unordered_timestamps() {
    let result = HistoricalSeries::new(
        vec![
            Observation::new(date(2024, 1, 2), 1.0),
            Observation::new(date(2024, 1, 1), 2.0),
        ],
        Granularity::Daily,
    );
    assert!(matches!(result, Err(ForecastError::InvalidSeries(_))));
}

#[test]
fn test_series_rejects_non_finite_values() {
    let result = HistoricalSeries::from_pairs(vec![(date(2024, 1, 1), f64::NAN)], Granularity::Daily);
    assert!(matches!(result, Err(ForecastError::InvalidSeries(_))));
}

#[test]
fn test_from_unsorted_orders_and_rejects_duplicates() {
    let series = HistoricalSeries::from_unsorted(
        vec![
            Observation::new(date(2024, 3, 1), 3.0),
            Observation::new(date(2024, 1, 1), 1.0),
            Observation::new(date(2024, 2, 1), 2.0),
        ],
        Granularity::Monthly,
    )
    .unwrap();
    assert_eq!(series.values(), vec![1.0, 2.0, 3.0]);

    let result = HistoricalSeries::from_unsorted(
        vec![
            Observation::new(date(2024, 1, 1), 1.0),
            Observation::new(date(2024, 1, 1), 2.0),
        ],
        Granularity::Monthly,
    );
    assert!(matches!(result, Err(ForecastError::InvalidSeries(_))));
}

#[test]
fn test_json_historical_dates() {
    let json = r#"{
        "historical": [
            {"date": "2024-01-03T00:00:00", "value": 3.5},
            {"date": "2024-01-01", "value": 1.5},
            {"date": "2024-01-02", "value": null},
            {"date": "2024-01-04", "value": "4.25"}
        ]
    }"#;

    let series = SeriesLoader::from_json_str(json, Granularity::Daily).unwrap();
    assert_eq!(
        series.observations(),
        &[
            Observation::new(date(2024, 1, 1), 1.5),
            Observation::new(date(2024, 1, 3), 3.5),
            Observation::new(date(2024, 1, 4), 4.25),
        ]
    );
    assert_eq!(series.granularity(), Granularity::Daily);
}

#[test]
fn test_json_years_map_to_january_first() {
    let json = r#"[{"year": 2019, "value": 10.0}, {"year": "2020", "value": 12.0}]"#;
    let series = SeriesLoader::from_json_str(json, Granularity::Yearly).unwrap();
    assert_eq!(series.timestamps(), vec![date(2019, 1, 1), date(2020, 1, 1)]);
}

#[test]
fn test_json_without_dates_is_rejected() {
    let json = r#"{"historical": [{"value": 1.0}]}"#;
    assert!(matches!(
        SeriesLoader::from_json_str(json, Granularity::Daily),
        Err(ForecastError::InvalidSeries(_))
    ));

    assert!(matches!(
        SeriesLoader::from_json_str("not json", Granularity::Daily),
        Err(ForecastError::JsonError(_))
    ));
}

#[test]
fn test_csv_with_dates() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,value").unwrap();
    writeln!(file, "2023-02-01,101.0").unwrap();
    writeln!(file, "2023-01-01,100.0").unwrap();
    writeln!(file, "2023-03-01,").unwrap();
    writeln!(file, "2023-04-01,103.5").unwrap();

    let series = SeriesLoader::from_csv(file.path(), Granularity::Monthly).unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(series.first().unwrap().timestamp, date(2023, 1, 1));
    assert_eq!(series.values(), vec![100.0, 101.0, 103.5]);
}

#[test]
fn test_csv_with_years() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "year,value").unwrap();
    writeln!(file, "1999,5").unwrap();
    writeln!(file, "2000,6").unwrap();

    let series = SeriesLoader::from_csv(file.path(), Granularity::Yearly).unwrap();
    assert_eq!(series.timestamps(), vec![date(1999, 1, 1), date(2000, 1, 1)]);
}

#[test]
fn test_csv_errors() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,price").unwrap();
    writeln!(file, "2023-01-01,1.0").unwrap();
    assert!(matches!(
        SeriesLoader::from_csv(file.path(), Granularity::Daily),
        Err(ForecastError::InvalidSeries(_))
    ));

    assert!(matches!(
        SeriesLoader::from_csv("/nonexistent/series.csv", Granularity::Daily),
        Err(ForecastError::IoError(_))
    ));
}
