//! Mean and confidence interval over repeated trial latencies.
//!
//! Accumulates up to a fixed number of double-precision samples and reports
//! the sample mean bracketed by a Student-t 99.9 % two-sided interval. The
//! critical values are tabulated for 1 to 30 degrees of freedom; larger
//! sample counts clamp to the last entry.

use rondo_error::{Result, RondoError};
use serde::{Deserialize, Serialize};

/// Two-sided 99.9 % Student-t critical values for 1..=30 degrees of freedom.
const T_CRITICAL_999: [f64; 30] = [
    636.6, 31.60, 12.92, 8.610, 6.869, 5.959, 5.408, 5.041, 4.781, 4.587, 4.437, 4.318, 4.221,
    4.140, 4.073, 4.015, 3.965, 3.922, 3.883, 3.850, 3.819, 3.792, 3.768, 3.745, 3.725, 3.707,
    3.690, 3.674, 3.659, 3.646,
];

/// `(lower, mean, upper)` latency bounds for one experiment cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyTriple {
    pub lower: f64,
    pub mean: f64,
    pub upper: f64,
}

/// Sample accumulator with a fixed capacity.
#[derive(Debug, Clone)]
pub struct ConfidenceInterval {
    samples: Vec<f64>,
    capacity: usize,
}

impl ConfidenceInterval {
    /// An empty accumulator for up to `capacity` samples.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Record one sample.
    ///
    /// # Panics
    ///
    /// Panics when called more than `capacity` times; feeding extra trials
    /// into a sized accumulator is a programming error.
    pub fn add(&mut self, sample: f64) {
        assert!(
            self.samples.len() < self.capacity,
            "confidence interval capacity {} exceeded",
            self.capacity
        );
        self.samples.push(sample);
    }

    /// Number of samples recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The `(lower, mean, upper)` summary of the recorded samples.
    ///
    /// # Errors
    ///
    /// [`RondoError::NotEnoughSamples`] with fewer than two samples (the
    /// interval needs at least one degree of freedom).
    pub fn summary(&self) -> Result<LatencyTriple> {
        let n = self.samples.len();
        if n < 2 {
            return Err(RondoError::NotEnoughSamples { needed: 2, have: n });
        }

        #[allow(clippy::cast_precision_loss)]
        let count = n as f64;
        let mean = self.samples.iter().sum::<f64>() / count;
        let variance = self
            .samples
            .iter()
            .map(|s| (s - mean) * (s - mean))
            .sum::<f64>()
            / (count - 1.0);
        let std_dev = variance.sqrt();

        let dof = (n - 1).min(T_CRITICAL_999.len());
        let t = T_CRITICAL_999[dof - 1];
        let half_width = t * std_dev / count.sqrt();

        Ok(LatencyTriple {
            lower: mean - half_width,
            mean,
            upper: mean + half_width,
        })
    }
}
