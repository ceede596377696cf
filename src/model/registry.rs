//! Per-scrape metric registry.

use super::{families, Labels, MetricFamily, MetricSample};
use std::collections::HashSet;

/// Collects samples for one scrape.
///
/// Every family in [`families::ALL`] is declared up front so its header is
/// rendered even when no sample arrives. Samples are kept in insertion order
/// within their family. A second sample with the same name and label set is
/// dropped: the first one wins.
pub struct MetricRegistry {
    entries: Vec<FamilyEntry>,
    seen: HashSet<(String, Labels)>,
}

struct FamilyEntry {
    family: MetricFamily,
    samples: Vec<MetricSample>,
}

impl MetricRegistry {
    /// Creates a registry with every exporter family declared.
    pub fn new() -> Self {
        Self::with_families(families::ALL)
    }

    /// Creates a registry with a custom family list.
    pub fn with_families(declared: &[MetricFamily]) -> Self {
        let mut entries: Vec<FamilyEntry> = Vec::with_capacity(declared.len());
        for family in declared {
            if entries.iter().any(|e| e.family.name == family.name) {
                continue;
            }
            entries.push(FamilyEntry {
                family: *family,
                samples: Vec::new(),
            });
        }
        Self {
            entries,
            seen: HashSet::new(),
        }
    }

    /// Adds a sample. Returns false if it was dropped.
    pub fn push(&mut self, sample: MetricSample) -> bool {
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.family.name == sample.name)
        else {
            tracing::warn!(metric = %sample.name, "Dropping sample for undeclared family");
            return false;
        };

        if !self.seen.insert((sample.name.clone(), sample.labels.clone())) {
            tracing::warn!(
                metric = %sample.name,
                labels = ?sample.labels,
                "Dropping duplicate sample"
            );
            return false;
        }

        entry.samples.push(sample);
        true
    }

    /// Adds every sample from an iterator.
    pub fn extend(&mut self, samples: impl IntoIterator<Item = MetricSample>) {
        for sample in samples {
            self.push(sample);
        }
    }

    /// Freezes the registry into an immutable snapshot.
    pub fn finish(self) -> Snapshot {
        Snapshot {
            families: self
                .entries
                .into_iter()
                .map(|e| (e.family, e.samples))
                .collect(),
        }
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable result of one collection cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    families: Vec<(MetricFamily, Vec<MetricSample>)>,
}

impl Snapshot {
    /// Iterates families in render order with their samples.
    pub fn families(&self) -> impl Iterator<Item = (&MetricFamily, &[MetricSample])> {
        self.families.iter().map(|(f, s)| (f, s.as_slice()))
    }

    /// Returns the samples recorded for a family name.
    pub fn samples(&self, name: &str) -> &[MetricSample] {
        self.families
            .iter()
            .find(|(f, _)| f.name == name)
            .map(|(_, s)| s.as_slice())
            .unwrap_or(&[])
    }

    /// Finds the sample of a family whose labels include all given pairs.
    pub fn find(&self, name: &str, labels: &[(&str, &str)]) -> Option<&MetricSample> {
        self.samples(name)
            .iter()
            .find(|s| labels.iter().all(|(k, v)| s.label(k) == Some(*v)))
    }
}
