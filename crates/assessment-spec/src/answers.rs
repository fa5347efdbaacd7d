use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Answers collected so far, keyed by answer key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<String, Value>);

/// Mutations accepted by [`AnswerMap::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOp {
    Set { key: String, value: Value },
    Merge(AnswerMap),
    Replace(AnswerMap),
    Remove { key: String },
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Single mutation entry point for the answer store.
    pub fn apply(&mut self, op: AnswerOp) {
        match op {
            AnswerOp::Set { key, value } => {
                self.0.insert(key, value);
            }
            AnswerOp::Merge(other) => self.0.extend(other.0),
            AnswerOp::Replace(other) => *self = other,
            AnswerOp::Remove { key } => {
                self.0.remove(&key);
            }
        }
    }

    /// Returns a copy of `self` with `overlay` written on top.
    pub fn overlaid(&self, overlay: &AnswerMap) -> AnswerMap {
        let mut merged = self.clone();
        merged.apply(AnswerOp::Merge(overlay.clone()));
        merged
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for AnswerMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[(String, Value); N]> for AnswerMap {
    fn from(entries: [(String, Value); N]) -> Self {
        Self(BTreeMap::from(entries))
    }
}

/// One pending edit of a question group that has not been committed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedAnswer {
    pub key: String,
    pub value: Value,
}

/// Answers buffered by the current question until it is marked answered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedAnswers {
    entries: Vec<StagedAnswer>,
}

impl StagedAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a value, replacing any earlier edit of the same key.
    pub fn stage(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.value = value,
            None => self.entries.push(StagedAnswer { key, value }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Staged entries as a standalone map, in the shape sent to the backend.
    pub fn to_map(&self) -> AnswerMap {
        self.entries
            .iter()
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect()
    }

    /// Writes every staged entry into `answers` and empties the buffer.
    pub fn flush_into(&mut self, answers: &mut AnswerMap) {
        for entry in self.entries.drain(..) {
            answers.apply(AnswerOp::Set {
                key: entry.key,
                value: entry.value,
            });
        }
    }
}
