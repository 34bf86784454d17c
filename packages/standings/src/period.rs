use std::collections::HashMap;

use common::config::ProgressConfig;

/// Ordered set of period labels; maps a label to its slot in
/// `per_period_correct`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeriodCatalog {
    labels: Vec<String>,
    slots: HashMap<String, usize>,
}

impl PeriodCatalog {
    /// Labels in course order. Duplicate labels keep their first slot.
    pub fn new(labels: Vec<String>) -> Self {
        let mut slots = HashMap::with_capacity(labels.len());
        for (slot, label) in labels.iter().enumerate() {
            slots.entry(label.clone()).or_insert(slot);
        }
        Self { labels, slots }
    }

    pub fn from_config(config: &ProgressConfig) -> Self {
        Self::new(config.period_labels())
    }

    pub fn slot(&self, label: &str) -> Option<usize> {
        self.slots.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}
