use std::io;
use trend_forecast::error::ForecastError;
use trend_math::MathError;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    assert!(matches!(ForecastError::from(io_error), ForecastError::IoError(_)));

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(ForecastError::from(json_error), ForecastError::JsonError(_)));
}

#[test]
fn test_math_errors_map_onto_taxonomy() {
    let cases = [
        (MathError::InsufficientData("n".into()), "InsufficientData"),
        (MathError::InvalidInput("x".into()), "InvalidSeries"),
        (MathError::CalculationError("singular".into()), "ForecastFit"),
        (MathError::NoConvergence(10), "ForecastFit"),
    ];

    for (math, expected) in cases {
        let converted = ForecastError::from(math);
        let variant = match converted {
            ForecastError::InsufficientData(_) => "InsufficientData",
            ForecastError::InvalidSeries(_) => "InvalidSeries",
            ForecastError::ForecastFit(_) => "ForecastFit",
            _ => "other",
        };
        assert_eq!(variant, expected);
    }
}

#[test]
fn test_error_display() {
    let error = ForecastError::UnsupportedGranularity("'hourly' is not supported".to_string());
    assert!(error.to_string().contains("hourly"));

    let error = ForecastError::from(MathError::NoConvergence(5000));
    let message = error.to_string();
    assert!(message.starts_with("Forecast fit failed"));
    assert!(message.contains("5000"));

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let message = ForecastError::from(io_error).to_string();
    assert!(message.contains("IO error"));
    assert!(message.contains("permission denied"));
}
