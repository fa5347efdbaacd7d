use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::visibility::PathCode;

const SHOW_IF_PATH2: &str = "SHOW_IF_PATH2";
const SHOW_IF_PATH3: &str = "SHOW_IF_PATH3";

/// Parsed form of a `showIf` / `hideIf` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub enum Rule {
    /// `[answerKey, expectedValue]`
    Equals { key: String, value: Value },
    /// `["SHOW_IF_PATH2"]` or `["SHOW_IF_PATH3"]`
    Path(PathCode),
}

#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("rule must not be empty")]
    Empty,
    #[error("rule key must be a string, got {0}")]
    KeyNotString(Value),
    #[error("rule '{0}' is missing its expected value")]
    MissingValue(String),
    #[error("rule has {0} elements, expected 2")]
    TooLong(usize),
}

impl Rule {
    pub fn equals(key: impl Into<String>, value: Value) -> Self {
        Rule::Equals {
            key: key.into(),
            value,
        }
    }

    /// Answer key referenced by the rule, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Rule::Equals { key, .. } => Some(key),
            Rule::Path(_) => None,
        }
    }
}

impl TryFrom<Vec<Value>> for Rule {
    type Error = RuleError;

    fn try_from(parts: Vec<Value>) -> Result<Self, Self::Error> {
        let mut parts = parts.into_iter();
        let key = match parts.next() {
            None => return Err(RuleError::Empty),
            Some(Value::String(key)) => key,
            Some(other) => return Err(RuleError::KeyNotString(other)),
        };
        let value = parts.next();
        let extra = parts.count();
        if extra > 0 {
            return Err(RuleError::TooLong(extra + 2));
        }
        match (key.as_str(), value) {
            (SHOW_IF_PATH2, None) => Ok(Rule::Path(PathCode::Two)),
            (SHOW_IF_PATH3, None) => Ok(Rule::Path(PathCode::Three)),
            (_, None) => Err(RuleError::MissingValue(key)),
            (_, Some(value)) => Ok(Rule::Equals { key, value }),
        }
    }
}

impl From<Rule> for Vec<Value> {
    fn from(rule: Rule) -> Self {
        match rule {
            Rule::Equals { key, value } => vec![Value::String(key), value],
            Rule::Path(PathCode::Three) => vec![Value::String(SHOW_IF_PATH3.into())],
            Rule::Path(_) => vec![Value::String(SHOW_IF_PATH2.into())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_equality_pair() {
        let rule: Rule = serde_json::from_value(json!(["abuseYesNo", false])).expect("rule");
        assert_eq!(rule, Rule::equals("abuseYesNo", json!(false)));
    }

    #[test]
    fn parses_path_sentinels() {
        let rule: Rule = serde_json::from_value(json!(["SHOW_IF_PATH3"])).expect("rule");
        assert_eq!(rule, Rule::Path(PathCode::Three));
        assert_eq!(serde_json::to_value(&rule).expect("json"), json!(["SHOW_IF_PATH3"]));
    }

    #[test]
    fn rejects_key_without_value() {
        let err = serde_json::from_value::<Rule>(json!(["lonely"])).unwrap_err();
        assert!(err.to_string().contains("missing its expected value"));
    }
}
