use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use snafu::ensure;

use crate::error::{BucketsNotCumulative, ConversionError, CountMismatch, NegativeBucketCount, NegativeCount};

/// Scratch state for one classic histogram series during a single scrape.
///
/// Collects the cumulative count observed for each upper bound, along with the total count and sum of the series.
/// Cumulative counts are kept ordered by upper bound, regardless of the order in which they were recorded.
///
/// Once any non-integral count, or any count of 2^63 or more, is recorded, the histogram is marked as holding float values, and stays that way until
/// [`reset`][Self::reset] is called.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TempHistogram {
    bucket_counts: BTreeMap<OrderedFloat<f64>, f64>,
    count: f64,
    sum: f64,
    has_float: bool,
}

impl TempHistogram {
    /// Creates an empty `TempHistogram`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the cumulative count observed for the given upper bound.
    ///
    /// A later observation for the same upper bound replaces the earlier one.
    ///
    /// # Errors
    ///
    /// If `count` is negative, an error is returned and nothing is recorded.
    pub fn set_bucket_count(&mut self, upper_bound: f64, count: f64) -> Result<(), ConversionError> {
        ensure!(!is_negative(count), NegativeBucketCount { upper_bound, count });

        self.observe_value(count);
        self.bucket_counts.insert(OrderedFloat(upper_bound), count);
        Ok(())
    }

    /// Sets the total count.
    ///
    /// # Errors
    ///
    /// If `count` is negative, an error is returned and the count is left unchanged.
    pub fn set_count(&mut self, count: f64) -> Result<(), ConversionError> {
        ensure!(!is_negative(count), NegativeCount { count });

        self.observe_value(count);
        self.count = count;
        Ok(())
    }

    /// Adds `delta` to the total count.
    ///
    /// # Errors
    ///
    /// If the resulting count would be negative, an error is returned and the count is left unchanged.
    pub fn add_count(&mut self, delta: f64) -> Result<(), ConversionError> {
        self.set_count(self.count + delta)
    }

    /// Sets the total sum.
    pub fn set_sum(&mut self, sum: f64) {
        self.sum = sum;
    }

    /// Adds `delta` to the total sum.
    pub fn add_sum(&mut self, delta: f64) {
        self.sum += delta;
    }

    /// Marks the histogram as holding float values.
    pub fn mark_fractional(&mut self) {
        self.has_float = true;
    }

    /// Returns the cumulative count recorded for the given upper bound, if any.
    pub fn bucket_count(&self, upper_bound: f64) -> Option<f64> {
        self.bucket_counts.get(&OrderedFloat(upper_bound)).copied()
    }

    /// Returns an iterator of `(upper_bound, cumulative_count)`, in ascending upper bound order.
    pub fn bucket_counts(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bucket_counts.iter().map(|(ub, count)| (ub.0, *count))
    }

    /// Returns the upper bounds with a recorded cumulative count, in ascending order.
    pub fn upper_bounds(&self) -> Vec<f64> {
        self.bucket_counts.keys().map(|ub| ub.0).collect()
    }

    /// Returns the total count.
    pub fn count(&self) -> f64 {
        self.count
    }

    /// Returns the total sum.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Returns `true` if any recorded count was non-integral.
    pub fn has_float(&self) -> bool {
        self.has_float
    }

    /// Returns `true` if no cumulative bucket counts have been recorded.
    pub fn is_empty(&self) -> bool {
        self.bucket_counts.is_empty()
    }

    /// Clears all recorded state, including the float marker.
    pub fn reset(&mut self) {
        self.bucket_counts.clear();
        self.count = 0.0;
        self.sum = 0.0;
        self.has_float = false;
    }

    /// Checks that the recorded observations describe a consistent classic histogram.
    ///
    /// Cumulative counts must not decrease as the upper bound grows, and when a `+Inf` bucket was recorded, the total
    /// count must match it.
    ///
    /// # Errors
    ///
    /// If either check fails, an error describing the first inconsistency is returned.
    pub fn validate(&self) -> Result<(), ConversionError> {
        let mut previous = None;
        for (upper_bound, current) in self.bucket_counts() {
            if let Some(previous) = previous {
                ensure!(
                    current >= previous,
                    BucketsNotCumulative {
                        upper_bound,
                        previous,
                        current
                    }
                );
            }
            previous = Some(current);
        }

        if let Some(inf_bucket) = self.bucket_count(f64::INFINITY) {
            ensure!(
                self.count == inf_bucket,
                CountMismatch {
                    count: self.count,
                    inf_bucket
                }
            );
        }

        Ok(())
    }

    fn observe_value(&mut self, value: f64) {
        // Non-finite values, and integral values beyond the range of the integer form, can only be carried faithfully by
        // the float form.
        if !value.is_finite() || value.fract() != 0.0 || value >= MAX_INTEGER_COUNT {
            self.has_float = true;
        }
    }
}

/// Exclusive upper limit, 2^63, of counts carried by the integer form.
const MAX_INTEGER_COUNT: f64 = 9_223_372_036_854_775_808.0;

fn is_negative(value: f64) -> bool {
    value < 0.0
}
