use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping from asset symbol to group label.
///
/// Entries iterate in insertion order so a labeling derived from a table
/// keeps that table's column order. Labels compare by equality only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMap {
    entries: IndexMap<String, String>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, label: impl Into<String>) {
        self.entries.insert(symbol.into(), label.into());
    }

    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.entries.get(symbol).map(String::as_str)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(symbol, label)| (symbol.as_str(), label.as_str()))
    }

    pub fn symbols(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Distinct labels in first-seen order.
    pub fn distinct_labels(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for label in self.entries.values() {
            if !seen.contains(label) {
                seen.push(label.clone());
            }
        }
        seen
    }

    /// Symbols carrying `label`, in entry order.
    pub fn members(&self, label: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, l)| l.as_str() == label)
            .map(|(symbol, _)| symbol.clone())
            .collect()
    }
}

impl FromIterator<(String, String)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
