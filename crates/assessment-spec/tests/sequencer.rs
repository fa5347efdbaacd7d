use serde_json::json;

use assessment_spec::{
    Activity, ActivityType, AnswerMap, AssessmentState, PathCode, Position, QuestionGroup,
    Sequencer, StateAction, Transition, VisibilityContext,
};

fn fixture() -> Vec<Activity> {
    serde_json::from_str(include_str!("fixtures/assessment.json")).expect("deserialize")
}

fn targets(uids: &[&str]) -> Vec<String> {
    uids.iter().map(|uid| uid.to_string()).collect()
}

#[test]
fn current_index_matches_position_in_navigable_list() {
    let activities = fixture();
    let answers = AnswerMap::new();
    let ctx = VisibilityContext::new(&answers, PathCode::One);

    for (expected, uid) in ["q1", "q2", "q3", "q4", "intro-end"].iter().enumerate() {
        let sequencer = Sequencer::new(&activities, 0, Some(*uid), ctx);
        assert_eq!(sequencer.current_index(), Some(expected));
    }

    let marker = Sequencer::new(&activities, 0, Some("intro-marker"), ctx);
    assert_eq!(marker.current_index(), None);
    let elsewhere = Sequencer::new(&activities, 0, Some("s1"), ctx);
    assert_eq!(elsewhere.current_index(), None);
    let unset = Sequencer::new(&activities, 0, None, ctx);
    assert_eq!(unset.current_index(), None);
}

#[test]
fn advance_not_allowed_is_a_no_op() {
    let activities = fixture();
    let answers = AnswerMap::new();
    let ctx = VisibilityContext::new(&answers, PathCode::One);
    let sequencer = Sequencer::new(&activities, 0, Some("q1"), ctx);

    assert_eq!(sequencer.advance(false, &[]), Transition::Stay);
    assert_eq!(
        sequencer.advance(false, &targets(&["intro-end"])),
        Transition::Stay
    );
}

#[test]
fn advance_steps_to_following_question() {
    let activities = fixture();
    let answers = AnswerMap::new();
    let ctx = VisibilityContext::new(&answers, PathCode::One);
    let sequencer = Sequencer::new(&activities, 0, Some("q1"), ctx);

    assert_eq!(
        sequencer.advance(true, &[]),
        Transition::Move { uid: "q2".into() }
    );
}

#[test]
fn advance_jumps_to_explicit_target() {
    let activities = fixture();
    let answers = AnswerMap::new();
    let ctx = VisibilityContext::new(&answers, PathCode::One);
    let sequencer = Sequencer::new(&activities, 0, Some("q1"), ctx);

    assert_eq!(
        sequencer.advance(true, &targets(&["nowhere", "intro-end"])),
        Transition::Move {
            uid: "intro-end".into()
        }
    );
}

#[test]
fn advance_falls_back_when_targets_are_missing() {
    let activities = fixture();
    let answers = AnswerMap::new();
    let ctx = VisibilityContext::new(&answers, PathCode::One);
    let sequencer = Sequencer::new(&activities, 0, Some("q1"), ctx);

    assert_eq!(
        sequencer.advance(true, &targets(&["nowhere"])),
        Transition::Move { uid: "q2".into() }
    );
}

#[test]
fn advance_skips_groups_hidden_by_rules() {
    let activities = fixture();
    let answers = AnswerMap::from([("abuseYesNo".to_string(), json!(false))]);

    let path_one = Sequencer::new(
        &activities,
        0,
        Some("q2"),
        VisibilityContext::new(&answers, PathCode::One),
    );
    assert_eq!(
        path_one.advance(true, &[]),
        Transition::Move {
            uid: "intro-end".into()
        }
    );

    let path_two = Sequencer::new(
        &activities,
        0,
        Some("q2"),
        VisibilityContext::new(&answers, PathCode::Two),
    );
    assert_eq!(
        path_two.advance(true, &[]),
        Transition::Move { uid: "q4".into() }
    );
}

#[test]
fn hidden_targets_are_not_jumped_to() {
    let activities = fixture();
    let answers = AnswerMap::from([("abuseYesNo".to_string(), json!(false))]);
    let ctx = VisibilityContext::new(&answers, PathCode::One);
    let sequencer = Sequencer::new(&activities, 0, Some("q1"), ctx);

    assert_eq!(
        sequencer.advance(true, &targets(&["q3"])),
        Transition::Move { uid: "q2".into() }
    );
}

#[test]
fn advancing_past_last_question_enters_next_activity() {
    let activities = fixture();
    let answers = AnswerMap::new();
    let ctx = VisibilityContext::new(&answers, PathCode::One);
    let sequencer = Sequencer::new(&activities, 0, Some("intro-end"), ctx);

    assert!(sequencer.is_last());
    assert_eq!(
        sequencer.advance(true, &[]),
        Transition::Fallthrough {
            locked: "intro".into(),
            activity_index: 1,
            uid: "s1".into(),
        }
    );
}

#[test]
fn locked_activities_are_passed_over() {
    let mut activities = fixture();
    activities[1].locked = true;
    let answers = AnswerMap::new();
    let ctx = VisibilityContext::new(&answers, PathCode::One);
    let sequencer = Sequencer::new(&activities, 0, Some("intro-end"), ctx);

    assert_eq!(
        sequencer.advance(true, &[]),
        Transition::Fallthrough {
            locked: "intro".into(),
            activity_index: 2,
            uid: "o1".into(),
        }
    );
}

#[test]
fn exhausting_final_activity_only_locks_it() {
    let activities = fixture();
    let mut state = AssessmentState::new();
    state.dispatch(StateAction::SetActivities(activities.clone()));
    state.dispatch(StateAction::SelectActivity(2));
    state.dispatch(StateAction::SetCurrentSection("o1".into()));

    let transition = state.sequencer().advance(true, &[]);
    assert_eq!(
        transition,
        Transition::Exhausted {
            locked: "outro".into()
        }
    );
    state.dispatch(StateAction::Apply(transition));

    assert_eq!(state.current_section(), Some("o1"));
    assert!(state.activities()[2].locked);
    assert!(!state.activities()[0].locked);
    assert!(!state.activities()[1].locked);
}

#[test]
fn two_activity_scenario_locks_first_and_moves_on() {
    let mut state = AssessmentState::new();
    state.dispatch(StateAction::SetActivities(vec![
        Activity::new(
            "A",
            ActivityType::Intro,
            vec![QuestionGroup::new("q1"), QuestionGroup::new("q2")],
        ),
        Activity::new("B", ActivityType::Outro, vec![QuestionGroup::new("q3")]),
    ]));
    state.dispatch(StateAction::SetCurrentSection("q2".into()));

    let transition = state.sequencer().advance(true, &[]);
    state.dispatch(StateAction::Apply(transition));

    assert!(state.activities()[0].locked);
    assert_eq!(state.current_section(), Some("q3"));
    assert_eq!(state.activity_index(), 1);
}

#[test]
fn position_distinguishes_markers_from_missing_sections() {
    let activities = fixture();
    let answers = AnswerMap::new();
    let ctx = VisibilityContext::new(&answers, PathCode::Two);

    let marker = Sequencer::new(&activities, 0, Some("intro-marker"), ctx);
    assert_eq!(marker.position(), Position::Marker("intro-marker".into()));
    assert_eq!(
        marker.advance(true, &[]),
        Transition::Move { uid: "q4".into() }
    );

    let stale = Sequencer::new(&activities, 0, Some("removed-question"), ctx);
    assert_eq!(stale.position(), Position::Missing("removed-question".into()));
    assert_eq!(
        stale.advance(true, &[]),
        Transition::Move { uid: "q1".into() }
    );
}

#[test]
fn render_prefix_stops_at_current_and_drops_hidden_groups() {
    let activities = fixture();
    let answers = AnswerMap::from([("abuseYesNo".to_string(), json!(false))]);
    let ctx = VisibilityContext::new(&answers, PathCode::One);
    let sequencer = Sequencer::new(&activities, 0, Some("intro-end"), ctx);

    let uids = sequencer
        .render_prefix()
        .iter()
        .map(|group| group.uid.as_str())
        .collect::<Vec<_>>();
    assert_eq!(uids, vec!["q1", "q2", "intro-end"]);
    assert_eq!(sequencer.visible_count(), 3);
}
