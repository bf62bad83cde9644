use indexmap::{map::Entry, IndexMap};
use snafu::OptionExt as _;
use tracing::debug;

use crate::{
    accumulator::TempHistogram,
    bounds::process_upper_bounds,
    builder::build_histogram,
    config::ConverterConfiguration,
    error::{ConversionError, InvalidBucketBound, MissingBucketLabel, MissingMetricName, NotHistogramComponent},
    histogram::ConvertedHistogram,
    identity::{histogram_metric_base, HistogramComponent},
    labels::Labels,
};

/// A classic histogram series converted into a native histogram.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvertedSeries {
    labels: Labels,
    histogram: ConvertedHistogram,
}

impl ConvertedSeries {
    /// Returns the labels identifying the series.
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Returns the converted histogram.
    pub fn histogram(&self) -> &ConvertedHistogram {
        &self.histogram
    }

    /// Consumes `self`, returning the labels and the converted histogram.
    pub fn into_parts(self) -> (Labels, ConvertedHistogram) {
        (self.labels, self.histogram)
    }
}

/// Collects the component samples of classic histograms and converts them into native histograms.
///
/// Samples for `_bucket`, `_sum`, and `_count` can be observed in any order, and are grouped by the series they belong
/// to. Once all samples of a scrape have been observed, [`finish`][Self::finish] converts every series and leaves the
/// collector empty, ready for the next scrape.
///
/// Series are returned in the order in which their first sample was observed.
#[derive(Debug)]
pub struct ClassicHistogramCollector {
    config: ConverterConfiguration,
    series: IndexMap<Labels, TempHistogram>,
}

impl ClassicHistogramCollector {
    /// Creates a new `ClassicHistogramCollector` with the given configuration.
    pub fn new(config: ConverterConfiguration) -> Self {
        Self {
            config,
            series: IndexMap::new(),
        }
    }

    /// Returns the number of series currently being collected.
    pub fn series_len(&self) -> usize {
        self.series.len()
    }

    /// Observes a single component sample.
    ///
    /// # Errors
    ///
    /// If the sample is not a component of a classic histogram, if a bucket sample has a missing or invalid upper bound,
    /// or if the value is a negative count, an error is returned and the sample is not recorded.
    pub fn observe(&mut self, labels: &Labels, value: f64) -> Result<(), ConversionError> {
        let metric_name = labels.metric_name().context(MissingMetricName)?;
        let component =
            HistogramComponent::from_metric_name(metric_name).context(NotHistogramComponent { metric: metric_name })?;

        let mut series_labels = histogram_metric_base(labels);
        if self.config.strip_bucket_label() {
            series_labels.remove(self.config.bucket_label());
        }

        match component {
            HistogramComponent::Bucket => {
                let bucket_label = self.config.bucket_label();
                let raw = labels.get(bucket_label).context(MissingBucketLabel {
                    metric: metric_name,
                    label: bucket_label,
                })?;
                let upper_bound = parse_upper_bound(raw).context(InvalidBucketBound {
                    metric: metric_name,
                    value: raw,
                })?;

                self.record(series_labels, |temp| temp.set_bucket_count(upper_bound, value))
            }
            HistogramComponent::Count => self.record(series_labels, |temp| temp.set_count(value)),
            HistogramComponent::Sum => self.record(series_labels, |temp| {
                temp.set_sum(value);
                Ok(())
            }),
        }
    }

    fn record<F>(&mut self, series_labels: Labels, record: F) -> Result<(), ConversionError>
    where
        F: FnOnce(&mut TempHistogram) -> Result<(), ConversionError>,
    {
        match self.series.entry(series_labels) {
            Entry::Occupied(mut entry) => record(entry.get_mut()),
            Entry::Vacant(entry) => {
                // Series only start tracking once one of their samples is accepted.
                let mut temp = TempHistogram::new();
                record(&mut temp)?;
                entry.insert(temp);
                Ok(())
            }
        }
    }

    /// Converts every collected series, leaving the collector empty.
    ///
    /// Series without any bucket samples are skipped.
    ///
    /// # Errors
    ///
    /// If validation is enabled and a series is inconsistent, or if a series cannot be converted, an error is returned.
    /// The collector is left empty either way.
    pub fn finish(&mut self) -> Result<Vec<ConvertedSeries>, ConversionError> {
        let series = std::mem::take(&mut self.series);
        let mut converted = Vec::with_capacity(series.len());

        for (labels, temp) in series {
            if temp.is_empty() {
                debug!(series = %labels, "Skipping classic histogram without any bucket samples.");
                continue;
            }

            if self.config.validate() {
                if let Err(e) = temp.validate() {
                    debug!(series = %labels, error = %e, "Classic histogram failed validation.");
                    return Err(e);
                }
            }

            let processed = process_upper_bounds(&temp.upper_bounds(), false);
            let histogram = build_histogram(temp, &processed)?;
            converted.push(ConvertedSeries { labels, histogram });
        }

        Ok(converted)
    }
}

fn parse_upper_bound(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|upper_bound| !upper_bound.is_nan())
}
