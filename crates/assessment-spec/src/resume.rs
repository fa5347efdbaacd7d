use crate::sequencer::entry_uid;
use crate::spec::Activity;
use crate::visibility::VisibilityContext;

/// Where a freshly loaded assessment should start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resumption {
    /// Answers have not been fetched yet; wait before positioning.
    Pending,
    /// Start from the first question of the first unlocked activity.
    Start { activity_index: usize, uid: String },
    /// Jump to the persisted section.
    Resume { activity_index: usize, uid: String },
    /// Every activity is locked or empty.
    Finished,
}

impl Resumption {
    pub fn target(&self) -> Option<(usize, &str)> {
        match self {
            Resumption::Start { activity_index, uid }
            | Resumption::Resume { activity_index, uid } => Some((*activity_index, uid)),
            Resumption::Pending | Resumption::Finished => None,
        }
    }
}

/// Compares the persisted pointer with the first question and decides
/// whether to resume.
///
/// A pointer that no activity contains still resumes (into the first
/// unlocked activity) so the sequencer reports and repairs the position.
pub fn resume(
    activities: &[Activity],
    persisted: Option<&str>,
    answers_loaded: bool,
    ctx: &VisibilityContext<'_>,
) -> Resumption {
    if !answers_loaded {
        return Resumption::Pending;
    }

    let first = activities
        .iter()
        .enumerate()
        .filter(|(_, activity)| !activity.locked)
        .find_map(|(index, activity)| entry_uid(activity, ctx).map(|uid| (index, uid)));
    let Some((first_index, first_uid)) = first else {
        return Resumption::Finished;
    };

    match persisted {
        Some(uid) if uid != first_uid => {
            let activity_index = activities
                .iter()
                .position(|activity| !activity.locked && activity.contains(uid))
                .unwrap_or(first_index);
            Resumption::Resume {
                activity_index,
                uid: uid.to_string(),
            }
        }
        _ => Resumption::Start {
            activity_index: first_index,
            uid: first_uid.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::AnswerMap;
    use crate::spec::{ActivityType, QuestionGroup};
    use crate::visibility::PathCode;

    fn activities() -> Vec<Activity> {
        vec![
            Activity::new(
                "intro",
                ActivityType::Intro,
                vec![QuestionGroup::new("q1"), QuestionGroup::new("q2")],
            ),
            Activity::new("outro", ActivityType::Outro, vec![QuestionGroup::new("q3")]),
        ]
    }

    #[test]
    fn waits_for_answers() {
        let answers = AnswerMap::new();
        let ctx = VisibilityContext::new(&answers, PathCode::One);
        assert_eq!(resume(&activities(), Some("q3"), false, &ctx), Resumption::Pending);
    }

    #[test]
    fn resumes_into_activity_holding_pointer() {
        let answers = AnswerMap::new();
        let ctx = VisibilityContext::new(&answers, PathCode::One);
        assert_eq!(
            resume(&activities(), Some("q3"), true, &ctx),
            Resumption::Resume {
                activity_index: 1,
                uid: "q3".into()
            }
        );
    }

    #[test]
    fn starts_fresh_when_pointer_is_first_question() {
        let answers = AnswerMap::new();
        let ctx = VisibilityContext::new(&answers, PathCode::One);
        assert_eq!(
            resume(&activities(), Some("q1"), true, &ctx),
            Resumption::Start {
                activity_index: 0,
                uid: "q1".into()
            }
        );
        assert_eq!(
            resume(&activities(), None, true, &ctx).target(),
            Some((0, "q1"))
        );
    }

    #[test]
    fn skips_locked_activities() {
        let mut activities = activities();
        activities[0].locked = true;
        let answers = AnswerMap::new();
        let ctx = VisibilityContext::new(&answers, PathCode::One);
        assert_eq!(resume(&activities, None, true, &ctx).target(), Some((1, "q3")));
    }
}
