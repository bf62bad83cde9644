use std::borrow::Borrow;

use snafu::Snafu;

/// A conversion error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum ConversionError {
    /// Boundary list does not fit into the bucket array of the base histogram.
    #[snafu(display(
        "Boundary list has {} entries but the base histogram only has {} buckets.",
        bounds,
        buckets
    ))]
    BoundsExceedBuckets {
        /// Number of upper bounds given.
        bounds: usize,

        /// Number of buckets in the base histogram.
        buckets: usize,
    },

    /// Base histogram matching the accumulated observations was not provided.
    #[snafu(display(
        "Missing base histogram: accumulated observations require the {} form.",
        histogram_form(fractional)
    ))]
    MissingBaseHistogram {
        /// Whether the float base histogram was the one required.
        fractional: bool,
    },

    /// A cumulative bucket count was negative.
    #[snafu(display("Bucket count for upper bound {} must be non-negative, got {}.", upper_bound, count))]
    NegativeBucketCount {
        /// Upper bound of the bucket.
        upper_bound: f64,

        /// Observed cumulative count.
        count: f64,
    },

    /// The total count was negative.
    #[snafu(display("Histogram count must be non-negative, got {}.", count))]
    NegativeCount {
        /// Observed total count.
        count: f64,
    },

    /// The total count disagrees with the `+Inf` bucket.
    #[snafu(display("Histogram count {} does not match the +Inf bucket count {}.", count, inf_bucket))]
    CountMismatch {
        /// Observed total count.
        count: f64,

        /// Cumulative count of the `+Inf` bucket.
        inf_bucket: f64,
    },

    /// Cumulative bucket counts decreased between two consecutive upper bounds.
    #[snafu(display(
        "Bucket count for upper bound {} ({}) is lower than the previous bucket count ({}).",
        upper_bound,
        current,
        previous
    ))]
    BucketsNotCumulative {
        /// Upper bound of the offending bucket.
        upper_bound: f64,

        /// Cumulative count of the preceding bucket.
        previous: f64,

        /// Cumulative count of the offending bucket.
        current: f64,
    },

    /// Sample has no metric name.
    #[snafu(display("Sample has no metric name."))]
    MissingMetricName,

    /// Sample is not a component of a classic histogram.
    #[snafu(display("Metric '{}' is not a classic histogram component.", metric))]
    NotHistogramComponent {
        /// Metric name of the sample.
        metric: String,
    },

    /// Bucket sample has no upper bound label.
    #[snafu(display("Bucket sample for metric '{}' is missing the '{}' label.", metric, label))]
    MissingBucketLabel {
        /// Metric name of the sample.
        metric: String,

        /// Name of the expected bucket label.
        label: String,
    },

    /// Bucket sample has an upper bound that is not a valid number.
    #[snafu(display("Bucket sample for metric '{}' has an invalid upper bound '{}'.", metric, value))]
    InvalidBucketBound {
        /// Metric name of the sample.
        metric: String,

        /// Raw value of the bucket label.
        value: String,
    },

    /// Environment variable prefix was empty.
    #[snafu(display("Environment variable prefix must not be empty."))]
    EmptyPrefix,

    /// Configuration could not be loaded.
    #[snafu(display("Failed to load converter configuration: {}", source))]
    Configuration {
        /// Error source.
        source: Box<figment::Error>,
    },
}

fn histogram_form<B: Borrow<bool>>(fractional: B) -> &'static str {
    if *fractional.borrow() {
        "float"
    } else {
        "integer"
    }
}
