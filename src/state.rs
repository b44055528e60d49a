use crate::dataset::Dataset;
use crate::error::EvalError;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only access to past expression results.
pub trait HistoryLookup {
    fn history(&self, name: &str) -> Option<&[Value]>;
}

/// Append-only per-identifier log of results, one entry per evaluated cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryCache {
    entries: BTreeMap<String, Vec<Value>>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: Value) {
        self.entries.entry(name.into()).or_default().push(value);
    }

    #[inline]
    pub fn latest(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).and_then(|values| values.last())
    }

    #[inline]
    pub fn len_of(&self, name: &str) -> usize {
        self.entries.get(name).map_or(0, Vec::len)
    }

    #[inline]
    pub fn identifier_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl HistoryLookup for HistoryCache {
    fn history(&self, name: &str) -> Option<&[Value]> {
        self.entries.get(name).map(Vec::as_slice)
    }
}

pub const DEFAULT_CYCLE_STATE_VAR: &str = "cycle";

/// Everything a filter may consult besides its inputs and parameters.
#[derive(Clone, Copy)]
pub struct ExecContext<'a> {
    dataset: Option<&'a dyn Dataset>,
    history: &'a dyn HistoryLookup,
    cycle_state_var: &'a str,
}

impl<'a> ExecContext<'a> {
    pub fn new(history: &'a dyn HistoryLookup) -> Self {
        Self {
            dataset: None,
            history,
            cycle_state_var: DEFAULT_CYCLE_STATE_VAR,
        }
    }

    pub fn with_dataset(mut self, dataset: Option<&'a dyn Dataset>) -> Self {
        self.dataset = dataset;
        self
    }

    pub fn with_cycle_state_var(mut self, name: &'a str) -> Self {
        self.cycle_state_var = name;
        self
    }

    #[inline]
    pub fn history(&self) -> &'a dyn HistoryLookup {
        self.history
    }

    #[inline]
    pub fn cycle_state_var(&self) -> &'a str {
        self.cycle_state_var
    }

    /// Dataset registry entry, or `MissingDataset` attributed to `filter`.
    #[inline]
    pub fn dataset(&self, filter: &'static str) -> Result<&'a dyn Dataset, EvalError> {
        self.dataset.ok_or(EvalError::MissingDataset { filter })
    }
}
