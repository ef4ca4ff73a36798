use approx::assert_relative_eq;
use trend_forecast::{ForecastError, VolatilityBandCalculator};

#[test]
fn test_two_differences_give_sample_std() {
    let calculator = VolatilityBandCalculator::default();
    let bands = calculator.calculate(&[1.0, 3.0], &[10.0, 10.0, 10.0, 10.0]).unwrap();

    let sigma = 2.0_f64.sqrt();
    assert_relative_eq!(bands.sigma, sigma, epsilon = 1e-12);
    assert_relative_eq!(bands.optimistic[0], 10.0 + sigma, epsilon = 1e-12);
    assert_relative_eq!(bands.pessimistic[0], 10.0 - sigma, epsilon = 1e-12);
    // sqrt(4) = 2
    assert_relative_eq!(bands.optimistic[3], 10.0 + 2.0 * sigma, epsilon = 1e-12);
}

#[test]
fn test_single_difference_is_not_enough() {
    let calculator = VolatilityBandCalculator::default();
    let result = calculator.calculate(&[1.0], &[5.0]);
    assert!(matches!(result, Err(ForecastError::InsufficientHistory(_))));

    let result = calculator.from_history(&[4.0, 5.0], &[5.0]);
    assert!(matches!(result, Err(ForecastError::InsufficientHistory(_))));
}

#[test]
fn test_steady_changes_collapse_bands() {
    let history: Vec<f64> = (0..30).map(|t| 50.0 + 0.25 * t as f64).collect();
    let point = vec![57.5, 57.75, 58.0];
    let bands = VolatilityBandCalculator::default()
        .from_history(&history, &point)
        .unwrap();

    assert_eq!(bands.sigma, 0.0);
    assert_eq!(bands.optimistic, point);
    assert_eq!(bands.pessimistic, point);
}

#[test]
fn test_bands_widen_with_horizon() {
    let differences = [0.4, -1.2, 0.8, 2.0, -0.3, 0.1, -0.9, 1.5];
    let point: Vec<f64> = (0..12).map(|h| 100.0 - h as f64).collect();
    let bands = VolatilityBandCalculator::new(12)
        .unwrap()
        .calculate(&differences, &point)
        .unwrap();

    assert_eq!(bands.optimistic.len(), point.len());
    assert_eq!(bands.pessimistic.len(), point.len());
    let widths: Vec<f64> = bands
        .optimistic
        .iter()
        .zip(bands.pessimistic.iter())
        .map(|(o, p)| o - p)
        .collect();
    assert!(widths.windows(2).all(|w| w[1] > w[0]));
    for (i, p) in point.iter().enumerate() {
        assert!(bands.pessimistic[i] <= *p && *p <= bands.optimistic[i]);
    }
}

#[test]
fn test_shorter_span_reacts_faster() {
    // calm history followed by a burst of large moves
    let mut differences = vec![0.1, -0.1, 0.1, -0.1, 0.1, -0.1, 0.1, -0.1];
    differences.extend([3.0, -3.0, 3.0]);

    let fast = VolatilityBandCalculator::new(3).unwrap().sigma(&differences).unwrap();
    let slow = VolatilityBandCalculator::new(30).unwrap().sigma(&differences).unwrap();
    assert!(fast > slow);
}

#[test]
fn test_zero_span_is_rejected() {
    assert!(matches!(
        VolatilityBandCalculator::new(0),
        Err(ForecastError::InvalidConfig(_))
    ));
}
