use serde_json::{Map, Value, json};

use crate::{
    spec::{Action, ActionKind, QuestionGroup},
    state::AssessmentState,
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The current question is waiting for an answer.
    NeedInput,
    /// Every activity is locked.
    Complete,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
        }
    }
}

/// Progress counters exposed to renderers.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct RenderAction {
    pub kind: String,
    pub answer_key: Option<String>,
    pub options: Vec<String>,
    pub current_value: Option<Value>,
    /// Rendered read-only because the group has already been answered.
    pub summary: bool,
}

#[derive(Debug, Clone)]
pub struct RenderGroup {
    pub uid: String,
    pub guide: Vec<String>,
    pub current: bool,
    pub actions: Vec<RenderAction>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub activity_id: Option<String>,
    pub activity_title: Option<String>,
    pub status: RenderStatus,
    pub current_uid: Option<String>,
    pub progress: RenderProgress,
    pub groups: Vec<RenderGroup>,
    /// Action types that could not be rendered.
    pub skipped_actions: Vec<String>,
}

/// Build the renderer payload for the groups the sequencer exposes.
pub fn build_render_payload(state: &AssessmentState) -> RenderPayload {
    let sequencer = state.sequencer();
    let current_uid = sequencer.current_group().map(|group| group.uid.clone());
    let prefix = sequencer.render_prefix();
    let mut skipped_actions = Vec::new();

    let groups = prefix
        .iter()
        .map(|group| {
            let current = current_uid.as_deref() == Some(group.uid.as_str());
            render_group(group, current, state, &mut skipped_actions)
        })
        .collect::<Vec<_>>();

    let answered = groups.iter().filter(|group| !group.current).count();
    let activity = state.active_activity();

    let status = if state.is_complete() {
        RenderStatus::Complete
    } else {
        RenderStatus::NeedInput
    };

    RenderPayload {
        activity_id: activity.map(|activity| activity.id.clone()),
        activity_title: activity.and_then(|activity| activity.metadata.title.clone()),
        status,
        current_uid,
        progress: RenderProgress {
            answered,
            total: sequencer.visible_count(),
        },
        groups,
        skipped_actions,
    }
}

fn render_group(
    group: &QuestionGroup,
    current: bool,
    state: &AssessmentState,
    skipped: &mut Vec<String>,
) -> RenderGroup {
    let actions = group
        .actions
        .iter()
        .filter_map(|action| match action {
            Action::Known(ActionKind::SectionChange { .. }) => None,
            Action::Known(kind) => Some(RenderAction {
                kind: kind.type_name().to_string(),
                answer_key: kind.answer_key().map(String::from),
                options: action_options(kind),
                current_value: kind
                    .answer_key()
                    .and_then(|key| state.answers().get(key))
                    .cloned(),
                summary: !current,
            }),
            Action::Unknown(unknown) => {
                skipped.push(unknown.kind.clone());
                None
            }
        })
        .collect();

    RenderGroup {
        uid: group.uid.clone(),
        guide: group.guide.clone(),
        current,
        actions,
    }
}

/// Labels offered by the action, in display order.
pub fn action_options(kind: &ActionKind) -> Vec<String> {
    match kind {
        ActionKind::Buttons { buttons, .. } => {
            buttons.iter().map(|button| button.label.clone()).collect()
        }
        ActionKind::Choice { options, .. } => {
            options.iter().map(|option| option.label.clone()).collect()
        }
        ActionKind::YesNo { .. } => vec!["yes".into(), "no".into()],
        ActionKind::Likert { options, .. }
        | ActionKind::Rank { options, .. }
        | ActionKind::Checklist { options, .. } => options.clone(),
        ActionKind::Sort { items, .. } => items.clone(),
        ActionKind::SecurityImage { images, .. } => images.clone(),
        ActionKind::SecurityQuestion { questions, .. } => questions.clone(),
        ActionKind::CopingStrategy { categories, .. } => categories.clone(),
        ActionKind::Slider { labels, .. } => labels.clone(),
        ActionKind::PhoneNumbers { numbers } => numbers.clone(),
        _ => Vec::new(),
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let groups = payload
        .groups
        .iter()
        .map(|group| {
            let actions = group
                .actions
                .iter()
                .map(|action| {
                    let mut map = Map::new();
                    map.insert("type".into(), Value::String(action.kind.clone()));
                    if let Some(key) = &action.answer_key {
                        map.insert("answerKey".into(), Value::String(key.clone()));
                    }
                    if !action.options.is_empty() {
                        map.insert(
                            "options".into(),
                            Value::Array(
                                action
                                    .options
                                    .iter()
                                    .map(|option| Value::String(option.clone()))
                                    .collect(),
                            ),
                        );
                    }
                    if let Some(value) = &action.current_value {
                        map.insert("currentValue".into(), value.clone());
                    }
                    map.insert("summary".into(), Value::Bool(action.summary));
                    Value::Object(map)
                })
                .collect::<Vec<_>>();
            json!({
                "uid": group.uid,
                "guide": group.guide,
                "current": group.current,
                "actions": actions,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "activity_id": payload.activity_id,
        "activity_title": payload.activity_title,
        "status": payload.status.as_str(),
        "current_uid": payload.current_uid,
        "progress": {
            "answered": payload.progress.answered,
            "total": payload.progress.total,
        },
        "groups": groups,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    let title = payload
        .activity_title
        .as_deref()
        .or(payload.activity_id.as_deref())
        .unwrap_or("<none>");
    lines.push(format!("Activity: {}", title));
    lines.push(format!(
        "Status: {} ({}/{})",
        payload.status.as_str(),
        payload.progress.answered,
        payload.progress.total
    ));

    if payload.status == RenderStatus::Complete {
        lines.push("All activities are complete.".to_string());
        return lines.join("\n");
    }

    for group in &payload.groups {
        let marker = if group.current { ">" } else { " " };
        lines.push(format!("{} [{}]", marker, group.uid));
        for line in &group.guide {
            lines.push(format!("    {}", line));
        }
        for action in &group.actions {
            let mut entry = format!("    - {}", action.kind);
            if !action.options.is_empty() {
                entry.push_str(&format!(" ({})", action.options.join("/")));
            }
            if let Some(value) = &action.current_value {
                entry.push_str(&format!(" = {}", value_to_display(value)));
            }
            lines.push(entry);
        }
    }

    lines.join("\n")
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => num.to_string(),
        other => other.to_string(),
    }
}
