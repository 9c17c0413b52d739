//! Descriptive statistics and least-squares slope.
//!
//! Every function is total: empty input yields zeros rather than NaN.

use pulsewatch_types::SeriesStatistics;

/// Arithmetic mean, or 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    // Neumaier summation keeps long series of decimal fractions from drifting
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for &v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            compensation += (sum - t) + v;
        } else {
            compensation += (v - t) + sum;
        }
        sum = t;
    }
    (sum + compensation) / values.len() as f64
}

/// Median; the mean of the two middle values for an even count.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (n - 1 denominator), 0 for fewer than two points.
pub fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Slope `b` of the ordinary least-squares fit `value = a + b * index`.
pub fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 || is_constant(values) {
        return 0.0;
    }

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}

/// Count, mean, min, max, median and sample standard deviation.
///
/// A series of identical values reports that value as its average and a
/// standard deviation of exactly 0.
pub fn describe(values: &[f64]) -> SeriesStatistics {
    if values.is_empty() {
        return SeriesStatistics::default();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return SeriesStatistics {
            count: values.len(),
            average: min,
            min,
            max,
            median: min,
            std_deviation: 0.0,
        };
    }

    let average = mean(values);
    SeriesStatistics {
        count: values.len(),
        average,
        min,
        max,
        median: median(values),
        std_deviation: sample_std_dev(values, average),
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[0] == pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_input_is_all_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(sample_std_dev(&[], 0.0), 0.0);
        assert_eq!(ols_slope(&[]), 0.0);
        assert_eq!(describe(&[]), SeriesStatistics::default());
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn std_dev_uses_sample_denominator() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert!(approx(m, 5.0));
        // Population sd is 2.0; sample sd is sqrt(32 / 7)
        assert!(approx(sample_std_dev(&values, m), (32.0f64 / 7.0).sqrt()));
        assert_eq!(sample_std_dev(&[42.0], 42.0), 0.0);
    }

    #[test]
    fn slope_of_linear_series() {
        let values: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        assert!(approx(ols_slope(&values), 2.0));

        let falling: Vec<f64> = (0..10).map(|i| 100.0 - 0.5 * i as f64).collect();
        assert!(approx(ols_slope(&falling), -0.5));

        assert_eq!(ols_slope(&[5.0; 12]), 0.0);
        assert_eq!(ols_slope(&[5.0]), 0.0);
    }

    #[test]
    fn identical_values_have_zero_spread() {
        for value in [0.1, 0.7, 1.1, 3.3, -2.9, 42.0] {
            for n in [2, 3, 7, 13, 100] {
                let values = vec![value; n];
                let stats = describe(&values);
                assert_eq!(stats.average, value, "average of {n} x {value}");
                assert_eq!(stats.std_deviation, 0.0, "std of {n} x {value}");
                assert_eq!(stats.median, value);
                assert_eq!(ols_slope(&values), 0.0);
            }
        }
    }

    #[test]
    fn compensated_mean_of_decimal_fractions() {
        let values = vec![0.1; 1000];
        assert!((mean(&values) - 0.1).abs() < 1e-15);
        assert!(approx(mean(&[0.1, 0.2, 0.3]), 0.2));
    }

    #[test]
    fn describe_collects_everything() {
        let stats = describe(&[1.0, 5.0, 3.0]);
        assert_eq!(stats.count, 3);
        assert!(approx(stats.average, 3.0));
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.median, 3.0);
        assert!(approx(stats.std_deviation, 2.0));
    }
}
