use assessment_spec::ActionKind;
use serde_json::{Map, Number, Value, json};

use crate::wizard::AnswerParseError;

/// Turns a line typed at the prompt into the value the action stores.
///
/// `Ok(None)` means there is nothing to stage (an optional answer left blank
/// or an acknowledgement with no answer key).
pub fn parse_answer(kind: &ActionKind, raw: &str) -> Result<Option<Value>, AnswerParseError> {
    let raw = raw.trim();
    match kind {
        ActionKind::Buttons { buttons, .. } => {
            if raw.is_empty() && buttons.len() == 1 {
                return Ok(Some(buttons[0].answer_value()));
            }
            let labels = buttons
                .iter()
                .map(|button| button.label.as_str())
                .collect::<Vec<_>>();
            let index = pick(&labels, raw)?;
            Ok(Some(buttons[index].answer_value()))
        }
        ActionKind::Choice {
            options, multiple, ..
        } => {
            let labels = options
                .iter()
                .map(|option| option.label.as_str())
                .collect::<Vec<_>>();
            if *multiple {
                let picked = split_list(raw)
                    .into_iter()
                    .map(|entry| pick(&labels, entry).map(|index| options[index].value.clone()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(Value::Array(picked)))
            } else {
                let index = pick(&labels, raw)?;
                Ok(Some(options[index].value.clone()))
            }
        }
        ActionKind::YesNo { .. } => parse_boolean(raw).map(Some),
        ActionKind::Counter { min, max, .. } => {
            let count = parse_integer(raw)?;
            if count < *min || max.is_some_and(|max| count > max) {
                let message = match max {
                    Some(max) => format!("Please enter a number from {} to {}.", min, max),
                    None => format!("Please enter at least {}.", min),
                };
                return Err(AnswerParseError::new(message, Some(format!("got {}", count))));
            }
            Ok(Some(Value::Number(Number::from(count))))
        }
        ActionKind::Slider { min, max, .. } => {
            let value = parse_number(raw)?;
            let position = value.as_f64().unwrap_or_default();
            if position < *min || position > *max {
                return Err(AnswerParseError::new(
                    format!("Please pick a value between {} and {}.", min, max),
                    None,
                ));
            }
            Ok(Some(value))
        }
        ActionKind::Likert { options, .. } | ActionKind::SecurityImage { images: options, .. } => {
            let index = pick(options, raw)?;
            Ok(Some(Value::String(options[index].clone())))
        }
        ActionKind::Rank { options, .. } => {
            let mut ranked = Vec::with_capacity(options.len());
            for entry in split_list(raw) {
                let index = pick(options, entry)?;
                if ranked.contains(&index) {
                    return Err(AnswerParseError::new(
                        "Please rank every option exactly once.",
                        Some(format!("'{}' appears twice", options[index])),
                    ));
                }
                ranked.push(index);
            }
            if ranked.len() != options.len() {
                return Err(AnswerParseError::new(
                    "Please rank every option exactly once.",
                    Some(format!("expected {} entries", options.len())),
                ));
            }
            Ok(Some(Value::Array(
                ranked
                    .into_iter()
                    .map(|index| Value::String(options[index].clone()))
                    .collect(),
            )))
        }
        ActionKind::Checklist { options, .. } => {
            let checked = split_list(raw)
                .into_iter()
                .map(|entry| pick(options, entry).map(|index| Value::String(options[index].clone())))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(Value::Array(checked)))
        }
        ActionKind::Sort { items, buckets, .. } => {
            let mut placed = Map::new();
            for entry in split_list(raw) {
                let (item, bucket) = entry.split_once('=').ok_or_else(|| {
                    AnswerParseError::new(
                        "Sort each item as item=bucket.",
                        Some(format!("could not read '{}'", entry)),
                    )
                })?;
                let item = &items[pick(items, item.trim())?];
                let bucket = &buckets[pick(buckets, bucket.trim())?];
                placed.insert(item.clone(), Value::String(bucket.clone()));
            }
            Ok(Some(Value::Object(placed)))
        }
        ActionKind::List { .. } | ActionKind::CopingStrategy { .. } => Ok(Some(Value::Array(
            split_list(raw)
                .into_iter()
                .map(|entry| Value::String(entry.to_string()))
                .collect(),
        ))),
        ActionKind::Text { required, .. } | ActionKind::Textarea { required, .. } => {
            if raw.is_empty() {
                if *required {
                    return Err(AnswerParseError::new(
                        "This question requires an answer.",
                        None,
                    ));
                }
                return Ok(None);
            }
            Ok(Some(Value::String(raw.to_string())))
        }
        ActionKind::Video { answer_key, .. } => match answer_key {
            None => Ok(None),
            Some(_) if raw.is_empty() => Ok(Some(Value::Bool(true))),
            Some(_) => parse_boolean(raw).map(Some),
        },
        ActionKind::Heard { .. } => {
            if raw.is_empty() {
                Ok(Some(Value::Bool(true)))
            } else {
                parse_boolean(raw).map(Some)
            }
        }
        ActionKind::SecurityQuestion { questions, .. } => {
            let (question, answer) = raw.split_once(':').ok_or_else(|| {
                AnswerParseError::new(
                    "Answer as <question number>: <answer>.",
                    Some(format!("questions: {}", numbered(questions))),
                )
            })?;
            let index = pick(questions, question.trim())?;
            Ok(Some(json!({
                "question": questions[index],
                "answer": answer.trim(),
            })))
        }
        ActionKind::SupportivePeople { .. } => {
            let contacts = raw
                .split(';')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(|entry| -> Result<Value, AnswerParseError> {
                    let (name, phone) = entry.split_once('=').ok_or_else(|| {
                        AnswerParseError::new(
                            "Enter contacts as name=phone; name=phone.",
                            Some(format!("could not read '{}'", entry)),
                        )
                    })?;
                    Ok(json!({ "name": name.trim(), "phone": phone.trim() }))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(Value::Array(contacts)))
        }
        ActionKind::PhoneNumbers { .. } | ActionKind::SectionChange { .. } => Ok(None),
    }
}

/// Short hint shown after the prompt title.
pub fn describe_input(kind: &ActionKind) -> Option<String> {
    match kind {
        ActionKind::Buttons { buttons, .. } => Some(format!(
            "({})",
            buttons
                .iter()
                .map(|button| button.label.as_str())
                .collect::<Vec<_>>()
                .join("/")
        )),
        ActionKind::Choice {
            options, multiple, ..
        } => {
            let labels = options
                .iter()
                .map(|option| option.label.as_str())
                .collect::<Vec<_>>()
                .join("/");
            if *multiple {
                Some(format!("(comma-separated: {})", labels))
            } else {
                Some(format!("({})", labels))
            }
        }
        ActionKind::YesNo { .. } => Some("(yes/no, y/n, true/false)".into()),
        ActionKind::Counter { min, max, .. } => Some(match max {
            Some(max) => format!("(whole number {}-{})", min, max),
            None => format!("(whole number, at least {})", min),
        }),
        ActionKind::Slider { min, max, .. } => Some(format!("(number {}-{})", min, max)),
        ActionKind::Likert { options, .. } | ActionKind::SecurityImage { images: options, .. } => {
            Some(format!("({})", options.join("/")))
        }
        ActionKind::Rank { options, .. } => {
            Some(format!("(comma-separated order of {})", options.join(", ")))
        }
        ActionKind::Checklist { options, .. } => {
            Some(format!("(comma-separated, any of {})", options.join(", ")))
        }
        ActionKind::Sort { buckets, .. } => {
            Some(format!("(item=bucket, ... into {})", buckets.join("/")))
        }
        ActionKind::List { .. } | ActionKind::CopingStrategy { .. } => {
            Some("(comma-separated entries)".into())
        }
        ActionKind::Video { .. } | ActionKind::Heard { .. } => Some("(press enter)".into()),
        ActionKind::SecurityQuestion { questions, .. } => {
            Some(format!("(number: answer) {}", numbered(questions)))
        }
        ActionKind::SupportivePeople { .. } => Some("(name=phone; name=phone)".into()),
        ActionKind::Text { .. }
        | ActionKind::Textarea { .. }
        | ActionKind::PhoneNumbers { .. }
        | ActionKind::SectionChange { .. } => None,
    }
}

fn parse_boolean(raw: &str) -> Result<Value, AnswerParseError> {
    match raw.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
        "false" | "f" | "no" | "n" | "0" => Ok(Value::Bool(false)),
        _ => Err(AnswerParseError::new(
            "Please enter yes or no.",
            Some("expected boolean (y/n/true/false)".to_string()),
        )),
    }
}

fn parse_integer(raw: &str) -> Result<i64, AnswerParseError> {
    raw.parse::<i64>().map_err(|_| {
        AnswerParseError::new(
            "Please enter a whole number.",
            Some("expected integer".to_string()),
        )
    })
}

fn parse_number(raw: &str) -> Result<Value, AnswerParseError> {
    raw.parse::<f64>()
        .map_err(|_| {
            AnswerParseError::new(
                "Please enter a number.",
                Some("expected number".to_string()),
            )
        })
        .and_then(|value| {
            Number::from_f64(value).map(Value::Number).ok_or_else(|| {
                AnswerParseError::new(
                    "Please enter a finite number.",
                    Some("number must be finite".to_string()),
                )
            })
        })
}

/// Resolves a 1-based index or a case-insensitive label.
fn pick<S: AsRef<str>>(options: &[S], raw: &str) -> Result<usize, AnswerParseError> {
    if let Ok(position) = raw.parse::<usize>()
        && (1..=options.len()).contains(&position)
    {
        return Ok(position - 1);
    }
    options
        .iter()
        .position(|option| option.as_ref().eq_ignore_ascii_case(raw))
        .ok_or_else(|| {
            let allowed = options
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(", ");
            AnswerParseError::new(
                format!("Choose one of: {}.", allowed),
                Some(format!("got '{}'", raw)),
            )
        })
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn numbered(options: &[String]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(index, option)| format!("{}) {}", index + 1, option))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(value: Value) -> ActionKind {
        serde_json::from_value(value).expect("action kind")
    }

    #[test]
    fn yes_no_accepts_short_forms() {
        let yes_no = kind(json!({ "type": "yes-no", "answerKey": "ok" }));
        assert_eq!(parse_answer(&yes_no, "Y").unwrap(), Some(Value::Bool(true)));
        assert_eq!(parse_answer(&yes_no, "no").unwrap(), Some(Value::Bool(false)));
        assert!(parse_answer(&yes_no, "maybe").is_err());
    }

    #[test]
    fn buttons_resolve_label_or_index() {
        let buttons = kind(json!({
            "type": "buttons",
            "answerKey": "ready",
            "buttons": [
                { "label": "Let's go", "value": true },
                { "label": "Later", "value": false }
            ]
        }));
        assert_eq!(parse_answer(&buttons, "2").unwrap(), Some(json!(false)));
        assert_eq!(parse_answer(&buttons, "let's go").unwrap(), Some(json!(true)));
        assert!(parse_answer(&buttons, "").is_err());
    }

    #[test]
    fn single_button_confirms_on_enter() {
        let buttons = kind(json!({ "type": "buttons", "buttons": [{ "label": "Finish" }] }));
        assert_eq!(parse_answer(&buttons, "").unwrap(), Some(json!("Finish")));
    }

    #[test]
    fn counter_enforces_its_range() {
        let counter = kind(json!({ "type": "counter", "answerKey": "n", "min": 1, "max": 3 }));
        assert_eq!(parse_answer(&counter, "2").unwrap(), Some(json!(2)));
        assert!(parse_answer(&counter, "0").is_err());
        assert!(parse_answer(&counter, "1.5").is_err());
    }

    #[test]
    fn rank_requires_a_full_permutation() {
        let rank = kind(json!({ "type": "rank", "answerKey": "r", "options": ["a", "b", "c"] }));
        assert_eq!(
            parse_answer(&rank, "c, a, b").unwrap(),
            Some(json!(["c", "a", "b"]))
        );
        assert!(parse_answer(&rank, "a, b").is_err());
        assert!(parse_answer(&rank, "a, a, b").is_err());
    }

    #[test]
    fn sort_builds_item_to_bucket_map() {
        let sort = kind(json!({
            "type": "sort",
            "answerKey": "s",
            "items": ["walk", "call"],
            "buckets": ["now", "later"]
        }));
        assert_eq!(
            parse_answer(&sort, "walk=now, call=2").unwrap(),
            Some(json!({ "walk": "now", "call": "later" }))
        );
    }

    #[test]
    fn optional_text_left_blank_stages_nothing() {
        let text = kind(json!({ "type": "textarea", "answerKey": "notes" }));
        assert_eq!(parse_answer(&text, "   ").unwrap(), None);
        let required = kind(json!({ "type": "text", "answerKey": "name", "required": true }));
        assert!(parse_answer(&required, "").is_err());
    }

    #[test]
    fn security_question_reads_number_and_answer() {
        let security = kind(json!({
            "type": "security-question",
            "answerKey": "sq",
            "questions": ["First pet?", "Home town?"]
        }));
        assert_eq!(
            parse_answer(&security, "2: Springfield").unwrap(),
            Some(json!({ "question": "Home town?", "answer": "Springfield" }))
        );
        assert!(parse_answer(&security, "Springfield").is_err());
    }

    #[test]
    fn supportive_people_split_into_contacts() {
        let people = kind(json!({ "type": "supportive-people", "answerKey": "people" }));
        assert_eq!(
            parse_answer(&people, "Ana=555-123-4567; Bo = 555 765 4321").unwrap(),
            Some(json!([
                { "name": "Ana", "phone": "555-123-4567" },
                { "name": "Bo", "phone": "555 765 4321" }
            ]))
        );
    }
}
