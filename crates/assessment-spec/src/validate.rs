use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::answers::AnswerMap;
use crate::spec::{Action, ActionKind, Activity, QuestionGroup};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Data problems found in a fetched question set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Checks the structural invariants of a question set: unique activity ids,
/// unique group uids per activity, known action types and goto targets that
/// exist in the same activity.
pub fn lint(activities: &[Activity]) -> LintReport {
    let mut errors = Vec::new();
    let mut activity_ids = BTreeSet::new();

    for (activity_pos, activity) in activities.iter().enumerate() {
        if !activity_ids.insert(activity.id.as_str()) {
            errors.push(ValidationError {
                uid: None,
                path: Some(format!("/{}", activity_pos)),
                message: format!("activity id '{}' is used more than once", activity.id),
                code: Some("duplicate_activity".into()),
            });
        }

        let uids: BTreeSet<&str> = activity
            .questions
            .iter()
            .map(|group| group.uid.as_str())
            .collect();
        let mut seen = BTreeSet::new();

        for (group_pos, group) in activity.questions.iter().enumerate() {
            let group_path = format!("/{}/questions/{}", activity_pos, group_pos);
            if !seen.insert(group.uid.as_str()) {
                errors.push(group_error(
                    group,
                    &group_path,
                    format!("uid '{}' is not unique within '{}'", group.uid, activity.id),
                    "duplicate_uid",
                ));
            }

            for (action_pos, action) in group.actions.iter().enumerate() {
                let action_path = format!("{}/actions/{}", group_path, action_pos);
                match action {
                    Action::Unknown(unknown) => errors.push(group_error(
                        group,
                        &action_path,
                        format!("unknown action type '{}'", unknown.kind),
                        "unknown_action",
                    )),
                    Action::Known(kind) => {
                        if let ActionKind::Text {
                            pattern: Some(pattern),
                            ..
                        } = kind
                            && let Err(err) = Regex::new(pattern)
                        {
                            errors.push(group_error(
                                group,
                                &action_path,
                                format!("pattern '{}' is not a valid regex: {}", pattern, err),
                                "invalid_pattern",
                            ));
                        }
                        for target in goto_targets(kind) {
                            if !uids.contains(target.as_str()) {
                                errors.push(group_error(
                                    group,
                                    &action_path,
                                    format!("goto target '{}' is not in '{}'", target, activity.id),
                                    "dangling_goto",
                                ));
                            }
                        }
                    }
                }
            }
        }
    }

    debug!(errors = errors.len(), "linted question set");
    LintReport {
        valid: errors.is_empty(),
        errors,
    }
}

/// Runs the answer checks of every action in `group` that gates its advance.
pub fn validate_group(group: &QuestionGroup, answers: &AnswerMap) -> Vec<ValidationError> {
    group
        .actions
        .iter()
        .filter_map(Action::known)
        .filter(|kind| kind.requires_validation())
        .filter_map(|kind| {
            let value = kind.answer_key().and_then(|key| answers.get(key));
            kind.validate_answer(value).err().map(|message| ValidationError {
                uid: Some(group.uid.clone()),
                path: kind.answer_key().map(|key| format!("/{}", key)),
                message,
                code: Some(kind.type_name().to_string()),
            })
        })
        .collect()
}

fn goto_targets(kind: &ActionKind) -> Vec<&String> {
    match kind {
        ActionKind::Buttons { buttons, .. } => {
            buttons.iter().flat_map(|button| &button.goto).collect()
        }
        ActionKind::Choice { options, .. } => {
            options.iter().flat_map(|option| &option.goto).collect()
        }
        _ => Vec::new(),
    }
}

fn group_error(group: &QuestionGroup, path: &str, message: String, code: &str) -> ValidationError {
    ValidationError {
        uid: Some(group.uid.clone()),
        path: Some(path.to_string()),
        message,
        code: Some(code.into()),
    }
}
