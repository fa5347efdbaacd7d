use assessment_spec::PathAssignments;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// What the user sees when the session repairs an unknown section pointer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// Report the problem and reposition without telling the user.
    #[default]
    Silent,
    /// Also show a toast before repositioning.
    Notify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Overrides the assignments read from custom activities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignments: Option<PathAssignments>,
    #[serde(default)]
    pub recovery: RecoveryPolicy,
    #[serde(default = "default_locked_message")]
    pub locked_message: String,
    #[serde(default = "default_recovery_message")]
    pub recovery_message: String,
}

fn default_locked_message() -> String {
    "This activity has already been completed and can no longer be changed.".into()
}

fn default_recovery_message() -> String {
    "We could not find where you left off, so we moved you to the next question.".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            assignments: None,
            recovery: RecoveryPolicy::default(),
            locked_message: default_locked_message(),
            recovery_message: default_recovery_message(),
        }
    }
}

impl SessionConfig {
    /// Parses a JSON config; blank input yields the defaults.
    pub fn from_json(config_json: &str) -> Result<Self, SessionError> {
        if config_json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(config_json).map_err(SessionError::ConfigParse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_config_uses_defaults() {
        let config = SessionConfig::from_json("  ").expect("config");
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn partial_config_fills_missing_fields() {
        let config = SessionConfig::from_json(
            r#"{"recovery":"notify","assignments":{"customLethalMeans":true}}"#,
        )
        .expect("config");
        assert_eq!(config.recovery, RecoveryPolicy::Notify);
        let assignments = config.assignments.expect("assignments");
        assert!(assignments.custom_lethal_means);
        assert!(!assignments.custom_self_assessment);
        assert_eq!(config.locked_message, default_locked_message());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let err = SessionConfig::from_json("{").unwrap_err();
        assert!(matches!(err, SessionError::ConfigParse(_)));
    }
}
