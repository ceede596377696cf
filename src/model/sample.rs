//! Metric samples and family metadata.

use std::collections::BTreeMap;
use std::fmt;

/// Label set attached to a sample, kept sorted by key.
pub type Labels = BTreeMap<String, String>;

/// Prometheus metric type of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonic total.
    Counter,
    /// Point-in-time value.
    Gauge,
}

impl MetricKind {
    /// Returns the exposition-format type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header metadata for a group of samples sharing a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricFamily {
    /// Metric name.
    pub name: &'static str,
    /// Help text rendered in the `# HELP` line.
    pub help: &'static str,
    /// Metric type rendered in the `# TYPE` line.
    pub kind: MetricKind,
}

impl MetricFamily {
    /// Creates a sample belonging to this family.
    pub fn sample<I, K, V>(&self, labels: I, value: f64) -> MetricSample
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        MetricSample {
            name: self.name.to_string(),
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            value,
            kind: self.kind,
        }
    }

    /// Creates an unlabeled sample belonging to this family.
    pub fn bare(&self, value: f64) -> MetricSample {
        self.sample(std::iter::empty::<(String, String)>(), value)
    }
}

/// A single observed value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Family name.
    pub name: String,
    /// Label set.
    pub labels: Labels,
    /// Observed value.
    pub value: f64,
    /// Type inherited from the family.
    pub kind: MetricKind,
}

impl MetricSample {
    /// Returns the value of a label, if present.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_FAMILY: MetricFamily = MetricFamily {
        name: "test_metric",
        help: "A test metric",
        kind: MetricKind::Gauge,
    };

    #[test]
    fn test_labels_sorted_regardless_of_insertion_order() {
        let sample = TEST_FAMILY.sample([("zeta", "1"), ("alpha", "2")], 1.0);
        let keys: Vec<&str> = sample.labels.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_bare_sample_has_no_labels() {
        let sample = TEST_FAMILY.bare(3.0);
        assert!(sample.labels.is_empty());
        assert_eq!(sample.kind, MetricKind::Gauge);
        assert_eq!(sample.name, "test_metric");
    }
}
