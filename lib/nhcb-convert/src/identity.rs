use crate::labels::{Labels, METRIC_NAME_LABEL};

/// A component sample of a classic histogram.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HistogramComponent {
    /// Cumulative count of observations up to an upper bound.
    Bucket,

    /// Sum of all observations.
    Sum,

    /// Total count of observations.
    Count,
}

impl HistogramComponent {
    /// All classic histogram components.
    pub const ALL: [Self; 3] = [Self::Bucket, Self::Sum, Self::Count];

    /// Returns the metric name suffix of this component.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Bucket => "_bucket",
            Self::Sum => "_sum",
            Self::Count => "_count",
        }
    }

    /// Returns the component denoted by the suffix of the given metric name, if any.
    pub fn from_metric_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|component| name.ends_with(component.suffix()))
    }
}

/// Returns the base name of a classic histogram metric.
///
/// Strips one trailing `_bucket`, `_sum`, or `_count` suffix. Names with any other suffix, such as `_created`, are
/// returned unchanged.
pub fn histogram_metric_base_name(name: &str) -> &str {
    HistogramComponent::from_metric_name(name)
        .and_then(|component| name.strip_suffix(component.suffix()))
        .unwrap_or(name)
}

/// Returns the labels identifying the classic histogram that the given component sample belongs to.
///
/// The metric name is replaced with its base name, as derived by [`histogram_metric_base_name`]. All other labels,
/// including the bucket label, are kept as-is.
pub fn histogram_metric_base(labels: &Labels) -> Labels {
    let mut base = labels.clone();
    if let Some(name) = labels.metric_name() {
        base.set(METRIC_NAME_LABEL, histogram_metric_base_name(name));
    }
    base
}
