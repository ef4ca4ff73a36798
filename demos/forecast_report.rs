//! Builds a synthetic monthly series, fits a trend, forecasts it at two
//! granularities through the daily cache, and prints a small report.
//!
//! Run with `RUST_LOG=debug cargo run --example forecast_report` to see the
//! fit and cache events.

use anyhow::Result;
use chrono::{Local, Months, NaiveDate};
use tracing_subscriber::EnvFilter;
use trendcast::{
    CacheKey, CachedForecaster, DailyCache, ForecastEngine, ForecastResult, Granularity, HistoricalSeries,
    RetryPolicy, TrendEstimator,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // stands in for a provider fetch that may fail transiently
    let series = RetryPolicy::default().run(synthetic_series)?;
    println!(
        "Loaded {} monthly observations ({} to {})",
        series.len(),
        series.first().map(|o| o.timestamp.to_string()).unwrap_or_default(),
        series.last().map(|o| o.timestamp.to_string()).unwrap_or_default()
    );

    let trend = TrendEstimator::new().estimate(&series, 36)?;
    println!(
        "Trend over the last {} months: {:+.4} per day (intercept {:.2})",
        trend.len(),
        trend.slope(),
        trend.intercept()
    );

    let cache_dir = std::env::temp_dir().join("trendcast-demo");
    let forecaster = CachedForecaster::new(ForecastEngine::new(), DailyCache::new(&cache_dir)?);
    let key = CacheKey::compose("MacroData", ["DEMO", "retail_sales"])?;
    let today = Local::now().date_naive();

    for granularity in [Granularity::Monthly, Granularity::Quarterly, Granularity::Yearly] {
        let recent = forecaster.engine().recent_history(&series, granularity)?;
        let forecast = forecaster.forecast(&key, &series, granularity, today)?;
        print_forecast(granularity, recent.len(), &forecast);
    }

    let monthly = forecaster.forecast(&key, &series, Granularity::Monthly, today)?;
    println!("\nMonthly forecast as JSON:\n{}", serde_json::to_string_pretty(&monthly)?);
    println!("\nCache entries live in {}", cache_dir.display());

    tracing::debug!("report finished");
    Ok(())
}

/// Eight years of upward drift with a yearly cycle
fn synthetic_series() -> Result<HistoricalSeries> {
    let start = NaiveDate::from_ymd_opt(2016, 1, 1).ok_or_else(|| anyhow::anyhow!("bad start date"))?;
    let series = HistoricalSeries::from_pairs(
        (0..96u32).map(|m| {
            let t = f64::from(m);
            let cycle = 12.0 * (2.0 * std::f64::consts::PI * t / 12.0).sin();
            let wobble = 3.0 * (t * 1.7).cos();
            (start + Months::new(m), 400.0 + 2.5 * t + cycle + wobble)
        }),
        Granularity::Monthly,
    )?;
    Ok(series)
}

fn print_forecast(granularity: Granularity, shown: usize, forecast: &ForecastResult) {
    println!(
        "\n{} forecast with {} (sigma {:.3}, {} periods of history shown)",
        granularity,
        forecast.model(),
        forecast.sigma(),
        shown
    );
    println!("{:<12} {:>12} {:>12} {:>12}", "period", "pessimistic", "point", "optimistic");
    for i in 0..forecast.horizon() {
        println!(
            "{:<12} {:>12.2} {:>12.2} {:>12.2}",
            forecast.future_timestamps()[i].to_string(),
            forecast.pessimistic()[i],
            forecast.point_forecast()[i],
            forecast.optimistic()[i]
        );
    }
}
