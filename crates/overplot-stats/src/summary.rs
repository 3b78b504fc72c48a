//! Summary statistics for a single coordinate or value column
//!
//! Provides the figures the kernels need:
//! - Count of finite values and of skipped (missing/NaN) ones
//! - Min, max, range
//! - Mean, sample variance, sample standard deviation

use serde::{Deserialize, Serialize};

/// Summary statistics for a numeric column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Number of finite values
    pub count: usize,
    /// Number of non-finite values
    pub missing: usize,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Mean (average)
    pub mean: f64,
    /// Sample variance (n - 1 denominator)
    pub variance: f64,
    /// Sample standard deviation
    pub std_dev: f64,
}

impl SummaryStats {
    /// Compute summary statistics from data
    ///
    /// Uses Welford's update so the column is read exactly once.
    pub fn from_data(data: &[f64]) -> Self {
        let mut count = 0usize;
        let mut mean = 0.0;
        let mut m2 = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for &x in data.iter().filter(|x| x.is_finite()) {
            count += 1;
            let delta = x - mean;
            mean += delta / count as f64;
            m2 += delta * (x - mean);
            min = min.min(x);
            max = max.max(x);
        }

        let missing = data.len() - count;
        if count == 0 {
            return Self::empty(missing);
        }

        // A single value has no spread
        let variance = if count > 1 {
            m2 / (count - 1) as f64
        } else {
            0.0
        };

        Self {
            count,
            missing,
            min,
            max,
            mean,
            variance,
            std_dev: variance.sqrt(),
        }
    }

    /// Create empty statistics (all NaN)
    fn empty(missing: usize) -> Self {
        Self {
            count: 0,
            missing,
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            variance: f64::NAN,
            std_dev: f64::NAN,
        }
    }

    /// Get the range (max - min)
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Whether no finite value was seen
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_stats_basic() {
        let data: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let stats = SummaryStats::from_data(&data);

        assert_eq!(stats.count, 10);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert!((stats.mean - 5.5).abs() < 1e-10);
        // Sample variance of 1..=10 is 55/6
        assert!((stats.variance - 55.0 / 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_stats_with_nan() {
        let data = vec![1.0, 2.0, f64::NAN, 4.0, 5.0];
        let stats = SummaryStats::from_data(&data);

        assert_eq!(stats.count, 4);
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.range(), 4.0);
    }

    #[test]
    fn test_single_value_has_zero_spread() {
        let stats = SummaryStats::from_data(&[3.0]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_empty() {
        let stats = SummaryStats::from_data(&[f64::NAN]);
        assert!(stats.is_empty());
        assert_eq!(stats.missing, 1);
        assert!(stats.mean.is_nan());
    }
}
