//! Label sets.

use std::fmt;

/// Name of the label holding the metric name.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Name of the label holding the upper bound of a classic histogram bucket.
pub const BUCKET_LABEL: &str = "le";

/// A single label.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Label {
    name: String,
    value: String,
}

impl Label {
    /// Returns the name of the label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of the label.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A set of labels identifying a series.
///
/// Labels are kept sorted by name, and each name appears at most once. Labels with an empty value are treated as
/// absent, so setting a label to an empty value removes it.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Labels {
    labels: Vec<Label>,
}

impl Labels {
    /// Creates an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a label set from the given name/value pairs.
    ///
    /// When a name is given more than once, the last value wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut labels = Self::new();
        for (name, value) in pairs {
            labels.set(name, value);
        }
        labels
    }

    /// Returns the number of labels in the set.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if the set contains no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns the value of the label with the given name, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).ok().map(|idx| self.labels[idx].value.as_str())
    }

    /// Returns the metric name, if present.
    pub fn metric_name(&self) -> Option<&str> {
        self.get(METRIC_NAME_LABEL)
    }

    /// Sets the label with the given name to the given value.
    ///
    /// An empty value removes the label.
    pub fn set<K, V>(&mut self, name: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Ok(idx) if value.is_empty() => {
                self.labels.remove(idx);
            }
            Ok(idx) => self.labels[idx].value = value,
            Err(_) if value.is_empty() => {}
            Err(idx) => self.labels.insert(idx, Label { name, value }),
        }
    }

    /// Removes the label with the given name, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).ok().map(|idx| self.labels.remove(idx).value)
    }

    /// Returns an iterator over the labels, in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    fn position(&self, name: &str) -> Result<usize, usize> {
        self.labels.binary_search_by(|label| label.name.as_str().cmp(name))
    }
}

impl<K, V> FromIterator<(K, V)> for Labels
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.metric_name() {
            write!(f, "{}", name)?;
        }

        write!(f, "{{")?;
        let mut first = true;
        for label in self.labels.iter().filter(|label| label.name != METRIC_NAME_LABEL) {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}=\"{}\"", label.name, label.value)?;
        }
        write!(f, "}}")
    }
}
