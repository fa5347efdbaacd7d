use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::spec::action::{Action, ActionKind};
use crate::spec::rule::Rule;

/// One step of the conversation: narration lines plus the actions to answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionGroup {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guide: Vec<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Vec<Value>>")]
    pub show_if: Option<Rule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Vec<Value>>")]
    pub hide_if: Option<Rule>,
}

impl QuestionGroup {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            guide: Vec::new(),
            actions: Vec::new(),
            show_if: None,
            hide_if: None,
        }
    }

    pub fn with_action(mut self, action: ActionKind) -> Self {
        self.actions.push(Action::Known(action));
        self
    }

    pub fn with_show_if(mut self, rule: Rule) -> Self {
        self.show_if = Some(rule);
        self
    }

    pub fn with_hide_if(mut self, rule: Rule) -> Self {
        self.hide_if = Some(rule);
        self
    }

    /// Groups whose only action is a section-change marker are bookkeeping
    /// entries and never shown as questions.
    pub fn is_section_change(&self) -> bool {
        matches!(self.actions.as_slice(), [action] if action.is_section_change())
    }

    /// First interactive action; the widget the user answers.
    pub fn primary_action(&self) -> Option<&ActionKind> {
        self.actions
            .iter()
            .filter_map(Action::known)
            .find(|kind| kind.is_interactive())
    }

    pub fn answer_keys(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().filter_map(Action::answer_key)
    }
}
