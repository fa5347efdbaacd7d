use crate::answers::{AnswerMap, AnswerOp};
use crate::sequencer::{Sequencer, Transition};
use crate::spec::{Activity, QuestionGroup};
use crate::visibility::{PathAssignments, PathCode, VisibilityContext};

/// Every mutation of [`AssessmentState`] goes through one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum StateAction {
    SetActivities(Vec<Activity>),
    Answers(AnswerOp),
    /// Replaces the answers with a fresh fetch and marks them loaded.
    AnswersLoaded(AnswerMap),
    SelectActivity(usize),
    SetCurrentSection(String),
    LockActivity(String),
    SetAssignments(PathAssignments),
    MarkResumed,
    Apply(Transition),
}

/// Page-level state shared by the sequencer and the question controllers.
#[derive(Debug, Clone, Default)]
pub struct AssessmentState {
    activities: Vec<Activity>,
    activity_index: usize,
    answers: AnswerMap,
    current_section: Option<String>,
    answers_loaded: bool,
    resumed: bool,
    assignments: PathAssignments,
}

impl AssessmentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, action: StateAction) {
        match action {
            StateAction::SetActivities(activities) => {
                self.activities = activities;
                if self.activity_index >= self.activities.len() {
                    self.activity_index = 0;
                }
            }
            StateAction::Answers(op) => self.answers.apply(op),
            StateAction::AnswersLoaded(answers) => {
                self.answers.apply(AnswerOp::Replace(answers));
                self.answers_loaded = true;
            }
            StateAction::SelectActivity(index) => self.activity_index = index,
            StateAction::SetCurrentSection(uid) => self.current_section = Some(uid),
            StateAction::LockActivity(id) => {
                if let Some(activity) = self.activities.iter_mut().find(|activity| activity.id == id) {
                    activity.locked = true;
                }
            }
            StateAction::SetAssignments(assignments) => self.assignments = assignments,
            StateAction::MarkResumed => self.resumed = true,
            StateAction::Apply(transition) => match transition {
                Transition::Stay => {}
                Transition::Move { uid } => self.current_section = Some(uid),
                Transition::Fallthrough {
                    locked,
                    activity_index,
                    uid,
                } => {
                    self.dispatch(StateAction::LockActivity(locked));
                    self.activity_index = activity_index;
                    self.current_section = Some(uid);
                }
                Transition::Exhausted { locked } => {
                    self.dispatch(StateAction::LockActivity(locked))
                }
            },
        }
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn activity_index(&self) -> usize {
        self.activity_index
    }

    pub fn active_activity(&self) -> Option<&Activity> {
        self.activities.get(self.activity_index)
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn current_section(&self) -> Option<&str> {
        self.current_section.as_deref()
    }

    pub fn answers_loaded(&self) -> bool {
        self.answers_loaded
    }

    pub fn resumed(&self) -> bool {
        self.resumed
    }

    pub fn assignments(&self) -> PathAssignments {
        self.assignments
    }

    pub fn path_code(&self) -> PathCode {
        self.assignments.path_code()
    }

    pub fn visibility(&self) -> VisibilityContext<'_> {
        VisibilityContext::new(&self.answers, self.path_code())
    }

    pub fn sequencer(&self) -> Sequencer<'_> {
        Sequencer::new(
            &self.activities,
            self.activity_index,
            self.current_section.as_deref(),
            self.visibility(),
        )
    }

    pub fn is_visible(&self, group: &QuestionGroup) -> bool {
        self.visibility().is_visible(group)
    }

    /// No unlocked activity remains.
    pub fn is_complete(&self) -> bool {
        !self.activities.is_empty() && self.activities.iter().all(|activity| activity.locked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ActivityType;

    #[test]
    fn fallthrough_locks_and_switches_activity() {
        let mut state = AssessmentState::new();
        state.dispatch(StateAction::SetActivities(vec![
            Activity::new("a", ActivityType::Intro, vec![QuestionGroup::new("q1")]),
            Activity::new("b", ActivityType::Outro, vec![QuestionGroup::new("q2")]),
        ]));
        state.dispatch(StateAction::Apply(Transition::Fallthrough {
            locked: "a".into(),
            activity_index: 1,
            uid: "q2".into(),
        }));
        assert!(state.activities()[0].locked);
        assert_eq!(state.activity_index(), 1);
        assert_eq!(state.current_section(), Some("q2"));
        assert!(!state.is_complete());
    }
}
