use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answers::AnswerMap;
use crate::spec::{Activity, ActivityType, QuestionGroup, Rule};

pub type VisibilityMap = std::collections::BTreeMap<String, bool>;

/// Which optional modules a user follows, encoded as path 1, 2 or 3.
///
/// Only two optional modules exist; a third could not be represented here
/// without reworking the encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum PathCode {
    #[default]
    One,
    Two,
    Three,
}

/// Optional activities assigned to the current user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PathAssignments {
    #[serde(default)]
    pub custom_lethal_means: bool,
    #[serde(default)]
    pub custom_self_assessment: bool,
}

impl PathAssignments {
    /// Reads the assignments off custom activities present in the fetch.
    pub fn from_activities(activities: &[Activity]) -> Self {
        let assigned = |kind: ActivityType| {
            activities
                .iter()
                .any(|activity| activity.kind == kind && activity.metadata.custom)
        };
        Self {
            custom_lethal_means: assigned(ActivityType::LethalMeans),
            custom_self_assessment: assigned(ActivityType::SuicideAssessment),
        }
    }

    pub fn path_code(&self) -> PathCode {
        match (self.custom_lethal_means, self.custom_self_assessment) {
            (true, true) => PathCode::Three,
            (true, false) | (false, true) => PathCode::Two,
            (false, false) => PathCode::One,
        }
    }
}

impl PathCode {
    pub fn as_u8(&self) -> u8 {
        match self {
            PathCode::One => 1,
            PathCode::Two => 2,
            PathCode::Three => 3,
        }
    }
}

/// Inputs the rules are evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityContext<'a> {
    pub answers: &'a AnswerMap,
    pub path: PathCode,
}

impl<'a> VisibilityContext<'a> {
    pub fn new(answers: &'a AnswerMap, path: PathCode) -> Self {
        Self { answers, path }
    }

    pub fn is_visible(&self, group: &QuestionGroup) -> bool {
        is_visible(group, self.answers, self.path)
    }
}

/// Whether `group` should be rendered given the current answers.
///
/// `hideIf` hides the group when the answer equals the expected value,
/// `showIf` hides it unless it does; path sentinels compare against `path`
/// instead. Both rules must pass when both are present.
pub fn is_visible(group: &QuestionGroup, answers: &AnswerMap, path: PathCode) -> bool {
    let hidden = match &group.hide_if {
        Some(Rule::Equals { key, value }) => answer_matches(answers.get(key), value),
        Some(Rule::Path(code)) => *code == path,
        None => false,
    };
    if hidden {
        return false;
    }

    match &group.show_if {
        Some(Rule::Equals { key, value }) => answer_matches(answers.get(key), value),
        Some(Rule::Path(code)) => *code == path,
        None => true,
    }
}

/// Strict equality where numbers compare by value, so `1` matches `1.0`.
fn answer_matches(answer: Option<&Value>, expected: &Value) -> bool {
    match (answer, expected) {
        (Some(Value::Number(left)), Value::Number(right)) => left.as_f64() == right.as_f64(),
        (Some(answer), expected) => answer == expected,
        (None, _) => false,
    }
}

pub fn resolve_visibility(activity: &Activity, ctx: &VisibilityContext<'_>) -> VisibilityMap {
    activity
        .questions
        .iter()
        .map(|group| (group.uid.clone(), ctx.is_visible(group)))
        .collect()
}
