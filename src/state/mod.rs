//! Shared run state
//!
//! A single key-value store is visible to every agent of one pipeline run.
//! Two kinds of values live in it:
//!
//! - **Control values** ([`StateValue::Text`]) such as `TOPIC` or
//!   `judge_feedback`, which may be read and replaced.
//! - **Accumulators** ([`StateValue::List`]) such as `pos_data` and
//!   `neg_data`, which only ever grow. Entries are never replaced or removed.
//!
//! The store is cheap to clone (it is an `Arc` around a lock) and every
//! mutation happens under one write lock, so concurrent appenders never lose
//! updates.

/// Instruction template resolution against a state view.
pub mod template;

use crate::types::{AppError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub use template::render_template;

/// Key under which the controller stores the research topic.
pub const TOPIC_KEY: &str = "TOPIC";

/// A value held in the shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    /// A single string (control keys).
    Text(String),
    /// An append-only sequence of strings (accumulator keys).
    List(Vec<String>),
}

impl StateValue {
    /// Render the value for substitution into an instruction.
    ///
    /// Lists become one `- entry` line per element.
    pub fn render(&self) -> String {
        match self {
            StateValue::Text(text) => text.clone(),
            StateValue::List(items) => items
                .iter()
                .map(|item| format!("- {}", item))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Number of entries: 1 for text, the list length otherwise.
    pub fn len(&self) -> usize {
        match self {
            StateValue::Text(_) => 1,
            StateValue::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A point-in-time copy of the shared state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    values: BTreeMap<String, StateValue>,
}

impl StateSnapshot {
    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.values.get(key)
    }

    /// Number of entries stored under `key` (0 when unset).
    pub fn len_of(&self, key: &str) -> usize {
        self.values.get(key).map(StateValue::len).unwrap_or(0)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Thread-safe state shared by every agent in a run.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<BTreeMap<String, StateValue>>>,
}

impl SharedState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<StateValue> {
        self.inner.read().get(key).cloned()
    }

    /// The text stored under `key`, if it holds a control value.
    pub fn get_text(&self, key: &str) -> Option<String> {
        match self.inner.read().get(key) {
            Some(StateValue::Text(text)) => Some(text.clone()),
            _ => None,
        }
    }

    /// The entries of the accumulator under `key` (empty when unset).
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.inner.read().get(key) {
            Some(StateValue::List(items)) => items.clone(),
            Some(StateValue::Text(text)) => vec![text.clone()],
            None => Vec::new(),
        }
    }

    /// Number of entries stored under `key` (0 when unset).
    pub fn len(&self, key: &str) -> usize {
        self.inner.read().get(key).map(StateValue::len).unwrap_or(0)
    }

    /// Store a control value.
    ///
    /// Accumulators are append-only, so replacing a key that already holds a
    /// list is rejected.
    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let mut guard = self.inner.write();
        if let Some(StateValue::List(_)) = guard.get(key) {
            return Err(AppError::InvalidInput(format!(
                "state key '{}' is an append-only accumulator",
                key
            )));
        }
        guard.insert(key.to_string(), StateValue::Text(value.into()));
        Ok(())
    }

    /// Append `item` to the accumulator under `key` and return its new length.
    ///
    /// An unset key becomes a one-element list. Control values cannot be
    /// appended to.
    pub fn append(&self, key: &str, item: impl Into<String>) -> Result<usize> {
        let mut guard = self.inner.write();
        let entry = guard
            .entry(key.to_string())
            .or_insert_with(|| StateValue::List(Vec::new()));

        match entry {
            StateValue::List(items) => {
                items.push(item.into());
                Ok(items.len())
            }
            StateValue::Text(_) => Err(AppError::InvalidInput(format!(
                "'{}' holds a single value and cannot be appended to",
                key
            ))),
        }
    }

    /// Copy the current contents.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            values: self.inner.read().clone(),
        }
    }
}
