use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9][0-9 ()\-.]{5,18}[0-9]$").expect("phone pattern is valid")
});

/// A single interactive widget inside a question group.
///
/// Actions whose `type` is not recognized (or whose fields do not match the
/// recognized shape) are kept as [`Action::Unknown`] so one bad entry never
/// fails the whole question fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Action {
    Known(ActionKind),
    Unknown(UnknownAction),
}

/// Raw payload of an action with an unrecognized `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UnknownAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    #[schemars(skip)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ButtonOption {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub goto: Vec<String>,
}

impl ButtonOption {
    /// Value stored when the button is pressed; the label when none is given.
    pub fn answer_value(&self) -> Value {
        self.value
            .clone()
            .unwrap_or_else(|| Value::String(self.label.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub label: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub goto: Vec<String>,
}

/// Every recognized action shape, tagged by its `type` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ActionKind {
    Buttons {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        answer_key: Option<String>,
        buttons: Vec<ButtonOption>,
    },
    Choice {
        answer_key: String,
        options: Vec<ChoiceOption>,
        #[serde(default)]
        multiple: bool,
    },
    YesNo {
        answer_key: String,
    },
    Counter {
        answer_key: String,
        #[serde(default)]
        min: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    Slider {
        answer_key: String,
        min: f64,
        max: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        labels: Vec<String>,
    },
    Likert {
        answer_key: String,
        options: Vec<String>,
    },
    Rank {
        answer_key: String,
        options: Vec<String>,
    },
    Sort {
        answer_key: String,
        items: Vec<String>,
        buckets: Vec<String>,
    },
    List {
        answer_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        #[serde(default)]
        min_items: usize,
    },
    Checklist {
        answer_key: String,
        options: Vec<String>,
    },
    Text {
        answer_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        #[serde(default)]
        required: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    Textarea {
        answer_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        #[serde(default)]
        required: bool,
    },
    Video {
        video: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        answer_key: Option<String>,
        #[serde(default)]
        require_completion: bool,
    },
    Heard {
        answer_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    SecurityImage {
        answer_key: String,
        images: Vec<String>,
    },
    SecurityQuestion {
        answer_key: String,
        questions: Vec<String>,
    },
    CopingStrategy {
        answer_key: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        categories: Vec<String>,
    },
    SupportivePeople {
        answer_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_contacts: Option<usize>,
    },
    PhoneNumbers {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        numbers: Vec<String>,
    },
    SectionChange {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        section: Option<String>,
    },
}

impl Action {
    pub fn known(&self) -> Option<&ActionKind> {
        match self {
            Action::Known(kind) => Some(kind),
            Action::Unknown(_) => None,
        }
    }

    /// The `type` tag as it appears in the payload.
    pub fn type_name(&self) -> &str {
        match self {
            Action::Known(kind) => kind.type_name(),
            Action::Unknown(unknown) => &unknown.kind,
        }
    }

    pub fn answer_key(&self) -> Option<&str> {
        self.known().and_then(ActionKind::answer_key)
    }

    pub fn is_section_change(&self) -> bool {
        matches!(self, Action::Known(ActionKind::SectionChange { .. }))
    }

    pub fn is_interactive(&self) -> bool {
        self.known().is_some_and(ActionKind::is_interactive)
    }

    pub fn requires_validation(&self) -> bool {
        self.known().is_some_and(ActionKind::requires_validation)
    }
}

impl ActionKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ActionKind::Buttons { .. } => "buttons",
            ActionKind::Choice { .. } => "choice",
            ActionKind::YesNo { .. } => "yes-no",
            ActionKind::Counter { .. } => "counter",
            ActionKind::Slider { .. } => "slider",
            ActionKind::Likert { .. } => "likert",
            ActionKind::Rank { .. } => "rank",
            ActionKind::Sort { .. } => "sort",
            ActionKind::List { .. } => "list",
            ActionKind::Checklist { .. } => "checklist",
            ActionKind::Text { .. } => "text",
            ActionKind::Textarea { .. } => "textarea",
            ActionKind::Video { .. } => "video",
            ActionKind::Heard { .. } => "heard",
            ActionKind::SecurityImage { .. } => "security-image",
            ActionKind::SecurityQuestion { .. } => "security-question",
            ActionKind::CopingStrategy { .. } => "coping-strategy",
            ActionKind::SupportivePeople { .. } => "supportive-people",
            ActionKind::PhoneNumbers { .. } => "phone-numbers",
            ActionKind::SectionChange { .. } => "section-change",
        }
    }

    pub fn answer_key(&self) -> Option<&str> {
        match self {
            ActionKind::Buttons { answer_key, .. } | ActionKind::Video { answer_key, .. } => {
                answer_key.as_deref()
            }
            ActionKind::Choice { answer_key, .. }
            | ActionKind::YesNo { answer_key }
            | ActionKind::Counter { answer_key, .. }
            | ActionKind::Slider { answer_key, .. }
            | ActionKind::Likert { answer_key, .. }
            | ActionKind::Rank { answer_key, .. }
            | ActionKind::Sort { answer_key, .. }
            | ActionKind::List { answer_key, .. }
            | ActionKind::Checklist { answer_key, .. }
            | ActionKind::Text { answer_key, .. }
            | ActionKind::Textarea { answer_key, .. }
            | ActionKind::Heard { answer_key, .. }
            | ActionKind::SecurityImage { answer_key, .. }
            | ActionKind::SecurityQuestion { answer_key, .. }
            | ActionKind::CopingStrategy { answer_key, .. }
            | ActionKind::SupportivePeople { answer_key, .. } => Some(answer_key),
            ActionKind::PhoneNumbers { .. } | ActionKind::SectionChange { .. } => None,
        }
    }

    /// Whether the user has to do something with this action to move on.
    pub fn is_interactive(&self) -> bool {
        !matches!(
            self,
            ActionKind::PhoneNumbers { .. } | ActionKind::SectionChange { .. }
        )
    }

    /// Actions that gate the advance behind an explicit check of their answer.
    pub fn requires_validation(&self) -> bool {
        match self {
            ActionKind::SecurityQuestion { .. }
            | ActionKind::SecurityImage { .. }
            | ActionKind::SupportivePeople { .. } => true,
            ActionKind::Video {
                require_completion, ..
            } => *require_completion,
            ActionKind::Text {
                required, pattern, ..
            } => *required || pattern.is_some(),
            ActionKind::Textarea { required, .. } => *required,
            ActionKind::List { min_items, .. } => *min_items > 0,
            _ => false,
        }
    }

    /// Branch targets attached to the option carrying `value`.
    pub fn goto_for(&self, value: &Value) -> Option<&[String]> {
        let targets = match self {
            ActionKind::Buttons { buttons, .. } => buttons
                .iter()
                .find(|button| &button.answer_value() == value)
                .map(|button| button.goto.as_slice()),
            ActionKind::Choice { options, .. } => options
                .iter()
                .find(|option| &option.value == value)
                .map(|option| option.goto.as_slice()),
            _ => None,
        };
        targets.filter(|targets| !targets.is_empty())
    }

    /// Checks a candidate answer against the shape this action produces.
    pub fn validate_answer(&self, value: Option<&Value>) -> Result<(), String> {
        match self {
            ActionKind::Buttons { answer_key, buttons } => match (answer_key, value) {
                (None, _) => Ok(()),
                (Some(_), None) => Err("Please choose an option.".into()),
                (Some(_), Some(value)) => {
                    if buttons.iter().any(|button| &button.answer_value() == value) {
                        Ok(())
                    } else {
                        Err("Please choose one of the listed options.".into())
                    }
                }
            },
            ActionKind::Choice {
                options, multiple, ..
            } => {
                let value = value.ok_or("Please choose an option.")?;
                let known = |candidate: &Value| options.iter().any(|option| &option.value == candidate);
                if *multiple {
                    let picked = value.as_array().ok_or("Expected a list of choices.")?;
                    if picked.is_empty() {
                        return Err("Please choose at least one option.".into());
                    }
                    if picked.iter().all(known) {
                        Ok(())
                    } else {
                        Err("Please choose only the listed options.".into())
                    }
                } else if known(value) {
                    Ok(())
                } else {
                    Err("Please choose one of the listed options.".into())
                }
            }
            ActionKind::YesNo { .. } => match value {
                Some(Value::Bool(_)) => Ok(()),
                _ => Err("Please answer yes or no.".into()),
            },
            ActionKind::Counter { min, max, .. } => {
                let count = value
                    .and_then(Value::as_i64)
                    .ok_or("Please enter a whole number.")?;
                if count < *min {
                    return Err(format!("Please enter at least {}.", min));
                }
                if let Some(max) = max
                    && count > *max
                {
                    return Err(format!("Please enter at most {}.", max));
                }
                Ok(())
            }
            ActionKind::Slider { min, max, .. } => {
                let position = value.and_then(Value::as_f64).ok_or("Please pick a value.")?;
                if position < *min || position > *max {
                    Err(format!("Please pick a value between {} and {}.", min, max))
                } else {
                    Ok(())
                }
            }
            ActionKind::Likert { options, .. } | ActionKind::SecurityImage { images: options, .. } => {
                match value.and_then(Value::as_str) {
                    Some(text) if options.iter().any(|option| option == text) => Ok(()),
                    _ => Err("Please choose one of the listed options.".into()),
                }
            }
            ActionKind::Rank { options, .. } => {
                let ranked = string_items(value).ok_or("Please rank every option.")?;
                let complete = ranked.len() == options.len()
                    && options.iter().all(|option| ranked.contains(&option.as_str()));
                if complete {
                    Ok(())
                } else {
                    Err("Please rank every option exactly once.".into())
                }
            }
            ActionKind::Sort { items, buckets, .. } => {
                let placed = value
                    .and_then(Value::as_object)
                    .ok_or("Please sort every item.")?;
                for item in items {
                    match placed.get(item).and_then(Value::as_str) {
                        Some(bucket) if buckets.iter().any(|known| known == bucket) => {}
                        _ => return Err(format!("Please sort '{}'.", item)),
                    }
                }
                Ok(())
            }
            ActionKind::List { min_items, .. } => {
                let entries = string_items(value).unwrap_or_default();
                let filled = entries.iter().filter(|entry| !entry.trim().is_empty()).count();
                if filled < *min_items {
                    Err(format!("Please add at least {} entries.", min_items))
                } else {
                    Ok(())
                }
            }
            ActionKind::Checklist { options, .. } => {
                let checked = string_items(value).ok_or("Expected a list of options.")?;
                if checked.iter().all(|item| options.iter().any(|option| option == item)) {
                    Ok(())
                } else {
                    Err("Please check only the listed options.".into())
                }
            }
            ActionKind::Text {
                required, pattern, ..
            } => {
                let text = value.and_then(Value::as_str).unwrap_or("");
                if *required && text.trim().is_empty() {
                    return Err("This question requires an answer.".into());
                }
                if let Some(pattern) = pattern
                    && !text.is_empty()
                    && let Ok(regex) = Regex::new(pattern)
                    && !regex.is_match(text)
                {
                    return Err("Answer does not have the expected format.".into());
                }
                Ok(())
            }
            ActionKind::Textarea { required, .. } => {
                let text = value.and_then(Value::as_str).unwrap_or("");
                if *required && text.trim().is_empty() {
                    Err("This question requires an answer.".into())
                } else {
                    Ok(())
                }
            }
            ActionKind::Video {
                require_completion, ..
            } => {
                if *require_completion && value.and_then(Value::as_bool) != Some(true) {
                    Err("Please watch the video before continuing.".into())
                } else {
                    Ok(())
                }
            }
            ActionKind::Heard { .. } => {
                if value.and_then(Value::as_bool) == Some(true) {
                    Ok(())
                } else {
                    Err("Please confirm before continuing.".into())
                }
            }
            ActionKind::SecurityQuestion { questions, .. } => {
                let entry = value
                    .and_then(Value::as_object)
                    .ok_or("Please choose a security question and answer it.")?;
                let question = entry.get("question").and_then(Value::as_str).unwrap_or("");
                if !questions.iter().any(|known| known == question) {
                    return Err("Please choose one of the security questions.".into());
                }
                let answer = entry.get("answer").and_then(Value::as_str).unwrap_or("");
                if answer.trim().is_empty() {
                    return Err("Please answer your security question.".into());
                }
                Ok(())
            }
            ActionKind::CopingStrategy { .. } => {
                let strategies = string_items(value).unwrap_or_default();
                if strategies.iter().any(|strategy| !strategy.trim().is_empty()) {
                    Ok(())
                } else {
                    Err("Please add at least one strategy.".into())
                }
            }
            ActionKind::SupportivePeople { max_contacts, .. } => {
                let contacts = match value {
                    None => return Ok(()),
                    Some(value) => value.as_array().ok_or("Expected a list of contacts.")?,
                };
                if let Some(max) = max_contacts
                    && contacts.len() > *max
                {
                    return Err(format!("Please add at most {} contacts.", max));
                }
                for contact in contacts {
                    let name = contact.get("name").and_then(Value::as_str).unwrap_or("");
                    if name.trim().is_empty() {
                        return Err("Every contact needs a name.".into());
                    }
                    let phone = contact.get("phone").and_then(Value::as_str).unwrap_or("");
                    if !PHONE_PATTERN.is_match(phone.trim()) {
                        return Err(format!("Please enter a valid phone number for {}.", name));
                    }
                }
                Ok(())
            }
            ActionKind::PhoneNumbers { .. } | ActionKind::SectionChange { .. } => Ok(()),
        }
    }
}

fn string_items(value: Option<&Value>) -> Option<Vec<&str>> {
    value?.as_array()?.iter().map(Value::as_str).collect()
}
