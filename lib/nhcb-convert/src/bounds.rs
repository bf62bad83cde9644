use crate::histogram::{FloatHistogram, Histogram};

/// Upper bounds of one series, normalized, along with the base histogram laid out for them.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedBounds {
    upper_bounds: Vec<f64>,
    base: Histogram,
}

impl ProcessedBounds {
    /// Returns the normalized upper bounds.
    ///
    /// When a `+Inf` upper bound was observed, it is kept as the last element here so that the overflow bucket is
    /// walked when building the histogram.
    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper_bounds
    }

    /// Returns the finite upper bounds, used as the custom bucket boundaries.
    pub fn custom_values(&self) -> &[f64] {
        self.base.custom_values()
    }

    /// Returns `true` if a `+Inf` upper bound was observed.
    pub fn has_infinite_bound(&self) -> bool {
        ends_with_infinity(&self.upper_bounds)
    }

    /// Returns the zero-valued integer base histogram.
    pub fn base_histogram(&self) -> &Histogram {
        &self.base
    }

    /// Returns the zero-valued float base histogram.
    pub fn base_float_histogram(&self) -> FloatHistogram {
        self.base.to_float()
    }

    /// Consumes `self`, returning the normalized upper bounds and the integer base histogram.
    pub fn into_parts(self) -> (Vec<f64>, Histogram) {
        (self.upper_bounds, self.base)
    }
}

fn ends_with_infinity(upper_bounds: &[f64]) -> bool {
    upper_bounds.last().is_some_and(|ub| *ub == f64::INFINITY)
}

/// Normalizes the upper bounds of a series and creates the base histogram for them.
///
/// Upper bounds are always sorted in ascending order. When `needs_dedup` is `true`, duplicates are removed as well. A
/// trailing `+Inf` is excluded from the custom bucket boundaries but still gets its own bucket, so the base histogram
/// has one bucket per finite upper bound plus one for `+Inf` when present.
pub fn process_upper_bounds(upper_bounds: &[f64], needs_dedup: bool) -> ProcessedBounds {
    let mut upper_bounds = upper_bounds.to_vec();
    upper_bounds.sort_by(f64::total_cmp);
    if needs_dedup {
        upper_bounds.dedup();
    }

    let finite_len = if ends_with_infinity(&upper_bounds) {
        upper_bounds.len() - 1
    } else {
        upper_bounds.len()
    };
    let custom_values = upper_bounds[..finite_len].to_vec();
    let base = Histogram::with_custom_buckets(custom_values, upper_bounds.len());

    ProcessedBounds { upper_bounds, base }
}
