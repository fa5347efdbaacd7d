use serde_json::json;

use assessment_spec::{
    Activity, AnswerMap, AnswerOp, AssessmentState, StateAction,
    render::{RenderStatus, build_render_payload, render_json_ui, render_text},
};

fn state_at(uid: &str, answers: AnswerMap) -> AssessmentState {
    let activities: Vec<Activity> =
        serde_json::from_str(include_str!("fixtures/assessment.json")).expect("deserialize");
    let mut state = AssessmentState::new();
    state.dispatch(StateAction::SetActivities(activities));
    state.dispatch(StateAction::AnswersLoaded(answers));
    let index = state
        .activities()
        .iter()
        .position(|activity| activity.contains(uid))
        .expect("uid in fixture");
    state.dispatch(StateAction::SelectActivity(index));
    state.dispatch(StateAction::SetCurrentSection(uid.into()));
    state
}

#[test]
fn payload_renders_prefix_up_to_current() {
    let state = state_at("q2", AnswerMap::from([("ready".to_string(), json!(true))]));
    let payload = build_render_payload(&state);

    assert_eq!(payload.status, RenderStatus::NeedInput);
    assert_eq!(payload.current_uid.as_deref(), Some("q2"));
    assert_eq!(payload.groups.len(), 2);
    assert!(payload.groups[0].actions[0].summary);
    assert_eq!(payload.groups[0].actions[0].current_value, Some(json!(true)));
    assert!(payload.groups[1].current);
    assert_eq!(payload.progress.answered, 1);
}

#[test]
fn unknown_actions_are_skipped_but_recorded() {
    let state = state_at("s1", AnswerMap::new());
    let payload = build_render_payload(&state);

    assert_eq!(payload.groups[0].actions.len(), 1);
    assert_eq!(payload.skipped_actions, vec!["hologram".to_string()]);
}

#[test]
fn render_text_marks_current_group() {
    let state = state_at("q1", AnswerMap::new());
    let text = render_text(&build_render_payload(&state));
    assert!(text.contains("Activity: Getting started"));
    assert!(text.contains("> [q1]"));
    assert!(text.contains("buttons (Let's go/Skip ahead)"));
}

#[test]
fn render_json_ui_exposes_groups() {
    let mut answers = AnswerMap::new();
    answers.apply(AnswerOp::Set {
        key: "mood".into(),
        value: json!("okay"),
    });
    let state = state_at("s2", answers);
    let ui = render_json_ui(&build_render_payload(&state));

    assert_eq!(ui["activity_id"], "plan");
    assert_eq!(ui["current_uid"], "s2");
    assert_eq!(ui["progress"]["total"], 2);
    let groups = ui["groups"].as_array().expect("groups");
    assert_eq!(groups[0]["actions"][0]["currentValue"], "okay");
    assert_eq!(groups[1]["actions"][1]["type"], "phone-numbers");
}
