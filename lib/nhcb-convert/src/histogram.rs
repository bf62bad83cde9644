//! Native histograms with custom bucket boundaries.

/// Schema marker for histograms using explicit, custom bucket boundaries.
pub const CUSTOM_BUCKETS_SCHEMA: i32 = -53;

/// A contiguous run of buckets.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Span {
    /// Gap to the previous span, or the starting bucket index for the first span.
    pub offset: i32,

    /// Number of consecutive buckets in the span.
    pub length: u32,
}

/// A histogram with integer bucket counts.
///
/// Bucket counts are occupancies: each value is the number of observations that fell into that bucket alone, not the
/// cumulative count up to its upper bound. When the histogram has one more bucket than custom values, the last bucket
/// is the `+Inf` overflow bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    schema: i32,
    count: u64,
    sum: f64,
    positive_spans: Vec<Span>,
    positive_buckets: Vec<i64>,
    custom_values: Vec<f64>,
}

/// A histogram with floating-point bucket counts.
///
/// Used when any contributing observation was non-integral. Otherwise identical in layout to [`Histogram`].
#[derive(Clone, Debug, PartialEq)]
pub struct FloatHistogram {
    schema: i32,
    count: f64,
    sum: f64,
    positive_spans: Vec<Span>,
    positive_buckets: Vec<f64>,
    custom_values: Vec<f64>,
}

fn spans_for(bucket_len: usize) -> Vec<Span> {
    if bucket_len == 0 {
        return Vec::new();
    }

    vec![Span {
        offset: 0,
        length: u32::try_from(bucket_len).unwrap_or(u32::MAX),
    }]
}

impl Histogram {
    /// Creates an empty histogram with the given custom boundaries and `bucket_len` zeroed buckets.
    pub fn with_custom_buckets(custom_values: Vec<f64>, bucket_len: usize) -> Self {
        Self {
            schema: CUSTOM_BUCKETS_SCHEMA,
            count: 0,
            sum: 0.0,
            positive_spans: spans_for(bucket_len),
            positive_buckets: vec![0; bucket_len],
            custom_values,
        }
    }

    /// Returns the bucket schema.
    pub fn schema(&self) -> i32 {
        self.schema
    }

    /// Returns the total number of observations.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns the sum of all observations.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Returns the spans describing the bucket layout.
    pub fn positive_spans(&self) -> &[Span] {
        &self.positive_spans
    }

    /// Returns the per-bucket occupancies.
    pub fn positive_buckets(&self) -> &[i64] {
        &self.positive_buckets
    }

    /// Returns the finite bucket boundaries.
    pub fn custom_values(&self) -> &[f64] {
        &self.custom_values
    }

    /// Returns an iterator of `(upper_bound, occupancy)` for every bucket.
    pub fn buckets(&self) -> impl Iterator<Item = (f64, i64)> + '_ {
        bucket_bounds(&self.custom_values).zip(self.positive_buckets.iter().copied())
    }

    /// Converts this histogram into a float histogram with the same layout and values.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_float(&self) -> FloatHistogram {
        FloatHistogram {
            schema: self.schema,
            count: self.count as f64,
            sum: self.sum,
            positive_spans: self.positive_spans.clone(),
            positive_buckets: self.positive_buckets.iter().map(|n| *n as f64).collect(),
            custom_values: self.custom_values.clone(),
        }
    }

    pub(crate) fn positive_buckets_mut(&mut self) -> &mut [i64] {
        &mut self.positive_buckets
    }

    pub(crate) fn set_totals(&mut self, count: u64, sum: f64) {
        self.count = count;
        self.sum = sum;
    }
}

impl FloatHistogram {
    /// Creates an empty float histogram with the given custom boundaries and `bucket_len` zeroed buckets.
    pub fn with_custom_buckets(custom_values: Vec<f64>, bucket_len: usize) -> Self {
        Self {
            schema: CUSTOM_BUCKETS_SCHEMA,
            count: 0.0,
            sum: 0.0,
            positive_spans: spans_for(bucket_len),
            positive_buckets: vec![0.0; bucket_len],
            custom_values,
        }
    }

    /// Returns the bucket schema.
    pub fn schema(&self) -> i32 {
        self.schema
    }

    /// Returns the total number of observations.
    pub fn count(&self) -> f64 {
        self.count
    }

    /// Returns the sum of all observations.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Returns the spans describing the bucket layout.
    pub fn positive_spans(&self) -> &[Span] {
        &self.positive_spans
    }

    /// Returns the per-bucket occupancies.
    pub fn positive_buckets(&self) -> &[f64] {
        &self.positive_buckets
    }

    /// Returns the finite bucket boundaries.
    pub fn custom_values(&self) -> &[f64] {
        &self.custom_values
    }

    /// Returns an iterator of `(upper_bound, occupancy)` for every bucket.
    pub fn buckets(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        bucket_bounds(&self.custom_values).zip(self.positive_buckets.iter().copied())
    }

    pub(crate) fn positive_buckets_mut(&mut self) -> &mut [f64] {
        &mut self.positive_buckets
    }

    pub(crate) fn set_totals(&mut self, count: f64, sum: f64) {
        self.count = count;
        self.sum = sum;
    }
}

// Custom values followed by the implicit `+Inf` bound of the overflow bucket.
fn bucket_bounds(custom_values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    custom_values.iter().copied().chain(std::iter::once(f64::INFINITY))
}

/// The result of converting a classic histogram.
///
/// Exactly one form is produced per conversion: the integer form when every observation was integral, and the float
/// form otherwise.
#[derive(Clone, Debug, PartialEq)]
pub enum ConvertedHistogram {
    /// Histogram with integer bucket counts.
    Integer(Histogram),

    /// Histogram with floating-point bucket counts.
    Float(FloatHistogram),
}

impl ConvertedHistogram {
    /// Returns `true` if this is the float form.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }

    /// Returns the integer form, if this is one.
    pub fn as_integer(&self) -> Option<&Histogram> {
        match self {
            Self::Integer(h) => Some(h),
            Self::Float(_) => None,
        }
    }

    /// Returns the float form, if this is one.
    pub fn as_float(&self) -> Option<&FloatHistogram> {
        match self {
            Self::Integer(_) => None,
            Self::Float(fh) => Some(fh),
        }
    }

    /// Returns the total number of observations.
    #[allow(clippy::cast_precision_loss)]
    pub fn count(&self) -> f64 {
        match self {
            Self::Integer(h) => h.count() as f64,
            Self::Float(fh) => fh.count(),
        }
    }

    /// Returns the sum of all observations.
    pub fn sum(&self) -> f64 {
        match self {
            Self::Integer(h) => h.sum(),
            Self::Float(fh) => fh.sum(),
        }
    }

    /// Returns the finite bucket boundaries.
    pub fn custom_values(&self) -> &[f64] {
        match self {
            Self::Integer(h) => h.custom_values(),
            Self::Float(fh) => fh.custom_values(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_layout_has_no_spans() {
        let h = Histogram::with_custom_buckets(Vec::new(), 0);
        assert_eq!(h.schema(), CUSTOM_BUCKETS_SCHEMA);
        assert!(h.positive_spans().is_empty());
        assert!(h.positive_buckets().is_empty());
    }

    #[test]
    fn buckets_include_overflow() {
        let h = Histogram::with_custom_buckets(vec![1.0, 2.0], 3);
        let bounds = h.buckets().map(|(ub, _)| ub).collect::<Vec<_>>();
        assert_eq!(bounds, vec![1.0, 2.0, f64::INFINITY]);

        // No overflow bucket when the layout only covers the finite boundaries.
        let h = Histogram::with_custom_buckets(vec![1.0, 2.0], 2);
        assert_eq!(h.buckets().count(), 2);
    }

    #[test]
    fn to_float_keeps_layout() {
        let h = Histogram::with_custom_buckets(vec![0.5, 1.0], 3);
        let fh = h.to_float();
        assert_eq!(fh.schema(), CUSTOM_BUCKETS_SCHEMA);
        assert_eq!(fh.positive_spans(), h.positive_spans());
        assert_eq!(fh.positive_buckets(), &[0.0, 0.0, 0.0]);
        assert_eq!(fh.custom_values(), h.custom_values());
    }
}
