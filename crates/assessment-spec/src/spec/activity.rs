use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::group::QuestionGroup;

/// Phase of the assessment an activity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Intro,
    StabilityPlan,
    LethalMeans,
    SuicideAssessment,
    ComfortAndSkills,
    Outro,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Set on optional modules assigned to a single user.
    #[serde(default)]
    pub custom: bool,
}

/// Named phase of the assessment with its ordered question groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    #[serde(default)]
    pub questions: Vec<QuestionGroup>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub metadata: ActivityMetadata,
}

impl Activity {
    pub fn new(id: impl Into<String>, kind: ActivityType, questions: Vec<QuestionGroup>) -> Self {
        Self {
            id: id.into(),
            kind,
            questions,
            locked: false,
            metadata: ActivityMetadata::default(),
        }
    }

    /// Question groups that can be navigated to, in order.
    pub fn navigable(&self) -> impl Iterator<Item = &QuestionGroup> {
        self.questions
            .iter()
            .filter(|group| !group.is_section_change())
    }

    pub fn first_question_uid(&self) -> Option<&str> {
        self.navigable().next().map(|group| group.uid.as_str())
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.questions.iter().any(|group| group.uid == uid)
    }

    pub fn group(&self, uid: &str) -> Option<&QuestionGroup> {
        self.questions.iter().find(|group| group.uid == uid)
    }
}
