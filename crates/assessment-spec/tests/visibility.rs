use serde_json::{Value, json};

use assessment_spec::{
    AnswerMap, PathAssignments, PathCode, QuestionGroup, Rule, VisibilityContext, is_visible,
    lint, resolve_visibility, spec::Activity,
};

fn answers(key: &str, value: Value) -> AnswerMap {
    AnswerMap::from([(key.to_string(), value)])
}

#[test]
fn hide_if_hides_only_on_matching_answer() {
    let group = QuestionGroup::new("g").with_hide_if(Rule::equals("abuseYesNo", json!(false)));

    assert!(!is_visible(&group, &answers("abuseYesNo", json!(false)), PathCode::One));
    assert!(is_visible(&group, &answers("abuseYesNo", json!(true)), PathCode::One));
    assert!(is_visible(&group, &answers("abuseYesNo", json!("false")), PathCode::One));
    assert!(is_visible(&group, &AnswerMap::new(), PathCode::One));
}

#[test]
fn show_if_requires_matching_answer() {
    let group = QuestionGroup::new("g").with_show_if(Rule::equals("mood", json!("happy")));

    assert!(is_visible(&group, &answers("mood", json!("happy")), PathCode::One));
    assert!(!is_visible(&group, &answers("mood", json!("sad")), PathCode::One));
    assert!(!is_visible(&group, &AnswerMap::new(), PathCode::One));
}

#[test]
fn numeric_rule_values_compare_by_value() {
    let group = QuestionGroup::new("g").with_show_if(Rule::equals("attempts", json!(1)));

    assert!(is_visible(&group, &answers("attempts", json!(1.0)), PathCode::One));
    assert!(is_visible(&group, &answers("attempts", json!(1)), PathCode::One));
    assert!(!is_visible(&group, &answers("attempts", json!(2)), PathCode::One));
    assert!(!is_visible(&group, &answers("attempts", json!("1")), PathCode::One));
}

#[test]
fn both_rules_must_pass() {
    let group = QuestionGroup::new("g")
        .with_show_if(Rule::equals("mood", json!("happy")))
        .with_hide_if(Rule::equals("skip", json!(true)));
    let mut both = answers("mood", json!("happy"));
    assert!(is_visible(&group, &both, PathCode::One));

    both.apply(assessment_spec::AnswerOp::Set {
        key: "skip".into(),
        value: json!(true),
    });
    assert!(!is_visible(&group, &both, PathCode::One));
}

#[test]
fn path_sentinel_matches_assignment_count() {
    let group: QuestionGroup = serde_json::from_value(json!({
        "uid": "path-two-only",
        "showIf": ["SHOW_IF_PATH2"]
    }))
    .expect("deserialize");

    let one_assigned = PathAssignments {
        custom_lethal_means: true,
        custom_self_assessment: false,
    };
    assert_eq!(one_assigned.path_code(), PathCode::Two);
    assert!(is_visible(&group, &AnswerMap::new(), one_assigned.path_code()));
    assert!(!is_visible(&group, &AnswerMap::new(), PathCode::One));
    assert!(!is_visible(&group, &AnswerMap::new(), PathCode::Three));
    assert_eq!(PathAssignments::default().path_code(), PathCode::One);
}

#[test]
fn visibility_map_reflects_live_answers() {
    let activities: Vec<Activity> =
        serde_json::from_str(include_str!("fixtures/assessment.json")).expect("deserialize");
    let mut live = AnswerMap::new();

    let before = resolve_visibility(&activities[0], &VisibilityContext::new(&live, PathCode::One));
    assert_eq!(before.get("q3"), Some(&true));

    live.apply(assessment_spec::AnswerOp::Set {
        key: "abuseYesNo".into(),
        value: json!(false),
    });
    let after = resolve_visibility(&activities[0], &VisibilityContext::new(&live, PathCode::One));
    assert_eq!(after.get("q3"), Some(&false));
}

#[test]
fn lint_reports_unknown_actions_and_dangling_targets() {
    let activities: Vec<Activity> = serde_json::from_value(json!([
        {
            "id": "intro",
            "type": "intro",
            "questions": [
                {
                    "uid": "q1",
                    "actions": [{
                        "type": "buttons",
                        "buttons": [{ "label": "Go", "goto": ["missing"] }]
                    }]
                },
                { "uid": "q1", "actions": [{ "type": "hologram" }] }
            ]
        }
    ]))
    .expect("deserialize");

    let report = lint(&activities);
    assert!(!report.valid);
    let codes = report
        .errors
        .iter()
        .filter_map(|error| error.code.as_deref())
        .collect::<Vec<_>>();
    assert_eq!(codes, vec!["dangling_goto", "duplicate_uid", "unknown_action"]);
}

#[test]
fn lint_reports_text_patterns_that_do_not_compile() {
    let activities: Vec<Activity> = serde_json::from_value(json!([
        {
            "id": "intro",
            "type": "intro",
            "questions": [
                {
                    "uid": "zip",
                    "actions": [{ "type": "text", "answerKey": "zip", "pattern": "^[0-9{5}$" }]
                },
                {
                    "uid": "name",
                    "actions": [{ "type": "text", "answerKey": "name", "pattern": "^\\w+$" }]
                }
            ]
        }
    ]))
    .expect("deserialize");

    let report = lint(&activities);
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].uid.as_deref(), Some("zip"));
    assert_eq!(report.errors[0].code.as_deref(), Some("invalid_pattern"));
}

#[test]
fn fixture_lints_except_for_unknown_action() {
    let activities: Vec<Activity> =
        serde_json::from_str(include_str!("fixtures/assessment.json")).expect("deserialize");
    let report = lint(&activities);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].uid.as_deref(), Some("s1"));
}
