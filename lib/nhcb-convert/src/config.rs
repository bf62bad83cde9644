use figment::{providers::Env, Figment};
use serde::Deserialize;
use snafu::{ensure, ResultExt as _};

use crate::{
    error::{Configuration, ConversionError, EmptyPrefix},
    labels::BUCKET_LABEL,
};

/// Converter configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConverterConfiguration {
    /// Label holding the upper bound of `_bucket` samples.
    ///
    /// Defaults to `le`.
    bucket_label: String,

    /// Whether to remove the bucket label from the labels identifying a converted series.
    ///
    /// When disabled, every bucket of a classic histogram ends up in its own series, so this is only useful when the
    /// samples given to the collector were already stripped of their bucket label upstream.
    ///
    /// Defaults to `true`.
    strip_bucket_label: bool,

    /// Whether to check that the classic histogram is internally consistent before converting it.
    ///
    /// When enabled, cumulative bucket counts must not decrease, and the total count must match the `+Inf` bucket.
    ///
    /// Defaults to `false`.
    validate: bool,
}

impl ConverterConfiguration {
    /// Creates a `ConverterConfiguration` from the given figment.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be deserialized, an error is returned.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConversionError> {
        figment.extract::<Self>().map_err(Box::new).context(Configuration)
    }

    /// Creates a `ConverterConfiguration` from environment variables.
    ///
    /// The prefix given will have an underscore appended to it if it does not already end with one. For example, with a
    /// prefix of `nhcb`, the bucket label would be read from `NHCB_BUCKET_LABEL`. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// If the prefix is empty, or the configuration cannot be deserialized, an error is returned.
    pub fn from_environment(prefix: &str) -> Result<Self, ConversionError> {
        ensure!(!prefix.is_empty(), EmptyPrefix);

        let prefix = if prefix.ends_with('_') {
            prefix.to_uppercase()
        } else {
            format!("{}_", prefix.to_uppercase())
        };

        Self::from_figment(&Figment::from(Env::prefixed(&prefix)))
    }

    /// Sets the label holding the upper bound of `_bucket` samples.
    pub fn with_bucket_label<S: Into<String>>(mut self, bucket_label: S) -> Self {
        self.bucket_label = bucket_label.into();
        self
    }

    /// Sets whether to remove the bucket label from the labels identifying a converted series.
    pub fn with_strip_bucket_label(mut self, strip_bucket_label: bool) -> Self {
        self.strip_bucket_label = strip_bucket_label;
        self
    }

    /// Sets whether to check classic histograms for consistency before converting them.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Returns the label holding the upper bound of `_bucket` samples.
    pub fn bucket_label(&self) -> &str {
        &self.bucket_label
    }

    /// Returns `true` if the bucket label is removed from the labels identifying a converted series.
    pub fn strip_bucket_label(&self) -> bool {
        self.strip_bucket_label
    }

    /// Returns `true` if classic histograms are checked for consistency before being converted.
    pub fn validate(&self) -> bool {
        self.validate
    }
}

impl Default for ConverterConfiguration {
    fn default() -> Self {
        Self {
            bucket_label: BUCKET_LABEL.to_string(),
            strip_bucket_label: true,
            validate: false,
        }
    }
}
