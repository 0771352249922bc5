use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::errors::ClusterError;

/// A single hyperparameter value, deserializable from TOML or JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            ParamValue::Int(i) if *i >= 0 => Some(*i as usize),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// One concrete hyperparameter assignment, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet {
    values: IndexMap<String, ParamValue>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Required non-negative integer parameter.
    pub fn require_usize(&self, name: &str) -> Result<usize, ClusterError> {
        self.values
            .get(name)
            .and_then(ParamValue::as_usize)
            .ok_or_else(|| {
                ClusterError::configuration(format!(
                    "parameter `{}` missing or not a non-negative integer",
                    name
                ))
            })
    }

    /// Optional non-negative integer parameter with a default.
    pub fn usize_or(&self, name: &str, default: usize) -> Result<usize, ClusterError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(value) => value.as_usize().ok_or_else(|| {
                ClusterError::configuration(format!(
                    "parameter `{}` is not a non-negative integer",
                    name
                ))
            }),
        }
    }
}

impl FromIterator<(String, ParamValue)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.values {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
            first = false;
        }
        Ok(())
    }
}

/// Candidate values per hyperparameter, consumed read-only by grid search.
///
/// Axes iterate in insertion order; the Cartesian product enumerates the
/// last axis fastest, so the first listed axis is the slowest-moving one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamGrid {
    axes: IndexMap<String, Vec<ParamValue>>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<ParamValue>) {
        self.axes.insert(name.into(), values);
    }

    pub fn axes(&self) -> impl Iterator<Item = (&str, &[ParamValue])> {
        self.axes.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn n_combinations(&self) -> usize {
        self.axes.values().map(Vec::len).product()
    }

    /// Enumerate the full Cartesian product in deterministic order.
    pub fn combinations(&self) -> Vec<ParamSet> {
        let mut combos = vec![ParamSet::new()];
        for (name, values) in &self.axes {
            let mut next = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for value in values {
                    let mut extended = combo.clone();
                    extended.insert(name.clone(), value.clone());
                    next.push(extended);
                }
            }
            combos = next;
        }
        combos
    }
}

impl FromIterator<(String, Vec<ParamValue>)> for ParamGrid {
    fn from_iter<I: IntoIterator<Item = (String, Vec<ParamValue>)>>(iter: I) -> Self {
        Self {
            axes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combination_order_last_axis_fastest() {
        let mut grid = ParamGrid::new();
        grid.insert("a", vec![1.into(), 2.into()]);
        grid.insert("b", vec![10.into(), 20.into()]);

        let combos = grid.combinations();
        assert_eq!(combos.len(), 4);
        assert_eq!(grid.n_combinations(), 4);

        let pairs: Vec<(usize, usize)> = combos
            .iter()
            .map(|c| {
                (
                    c.get("a").unwrap().as_usize().unwrap(),
                    c.get("b").unwrap().as_usize().unwrap(),
                )
            })
            .collect();
        assert_eq!(pairs, vec![(1, 10), (1, 20), (2, 10), (2, 20)]);
    }

    #[test]
    fn test_empty_grid_yields_single_empty_combination() {
        let combos = ParamGrid::new().combinations();
        assert_eq!(combos.len(), 1);
        assert!(combos[0].is_empty());
    }

    #[test]
    fn test_grid_parses_from_toml() {
        let grid: ParamGrid = toml::from_str("k = [2, 3, 4]\nmax_iter = [100]\n").unwrap();
        assert_eq!(grid.n_combinations(), 3);

        let combos = grid.combinations();
        assert_eq!(combos[0].require_usize("k").unwrap(), 2);
        assert_eq!(combos[0].require_usize("max_iter").unwrap(), 100);
    }

    #[test]
    fn test_require_usize_rejects_wrong_type() {
        let mut params = ParamSet::new();
        params.insert("k", "three");
        assert!(matches!(
            params.require_usize("k"),
            Err(ClusterError::Configuration { .. })
        ));
    }
}
