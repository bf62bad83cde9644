//! Conversion of classic histograms into native histograms with custom buckets.
//!
//! A classic histogram is exposed as a family of samples: one `_bucket` sample per upper bound holding the cumulative
//! count of observations up to that bound, plus a `_sum` and a `_count` sample. This crate turns the samples of one
//! such histogram into a single native histogram whose buckets use the same explicit boundaries, holding per-bucket
//! occupancies instead of cumulative counts.
//!
//! # Usage
//!
//! The conversion is split into the same steps a scraper goes through:
//!
//! - [`histogram_metric_base`] derives the series identity shared by the `_bucket`, `_sum`, and `_count` samples.
//! - [`TempHistogram`] accumulates the cumulative counts, count, and sum of one series, in any order.
//! - [`process_upper_bounds`] normalizes the observed upper bounds and lays out the base histogram.
//! - [`new_histogram`] (or [`build_histogram`]) derives the per-bucket occupancies.
//!
//! [`ClassicHistogramCollector`] ties these together for callers that simply want to feed it samples.
//!
//! ```
//! use nhcb_convert::{ClassicHistogramCollector, ConverterConfiguration, Labels};
//!
//! let mut collector = ClassicHistogramCollector::new(ConverterConfiguration::default());
//! for (name, le, value) in [
//!     ("latency_bucket", "1", 10.0),
//!     ("latency_bucket", "2", 15.0),
//!     ("latency_bucket", "+Inf", 25.0),
//!     ("latency_count", "", 25.0),
//!     ("latency_sum", "", 50.0),
//! ] {
//!     let labels = Labels::from_pairs([("__name__", name), ("le", le), ("job", "api")]);
//!     collector.observe(&labels, value).unwrap();
//! }
//!
//! let converted = collector.finish().unwrap();
//! let histogram = converted[0].histogram().as_integer().unwrap();
//! assert_eq!(histogram.custom_values(), &[1.0, 2.0]);
//! assert_eq!(histogram.positive_buckets(), &[10, 5, 10]);
//! ```
#![deny(warnings)]
#![deny(missing_docs)]

mod accumulator;
pub use self::accumulator::TempHistogram;

mod bounds;
pub use self::bounds::{process_upper_bounds, ProcessedBounds};

mod builder;
pub use self::builder::{build_histogram, new_histogram};

mod collector;
pub use self::collector::{ClassicHistogramCollector, ConvertedSeries};

mod config;
pub use self::config::ConverterConfiguration;

mod error;
pub use self::error::ConversionError;

pub mod histogram;
pub use self::histogram::{ConvertedHistogram, FloatHistogram, Histogram};

mod identity;
pub use self::identity::{histogram_metric_base, histogram_metric_base_name, HistogramComponent};

pub mod labels;
pub use self::labels::Labels;
