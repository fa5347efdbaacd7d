//! Walks the question groups of the active activity.
//!
//! The sequencer is a pure planner: it reads the activities, the current
//! section pointer and the answers, and describes the next move as a
//! [`Transition`]. Applying the move (locking, persisting the pointer) is
//! left to the owner of the assessment state.

use crate::spec::{Activity, QuestionGroup};
use crate::visibility::VisibilityContext;

/// Where the current section pointer lands within the active activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// No pointer has been set yet.
    Unpositioned,
    /// Index into the navigable groups of the active activity.
    At(usize),
    /// The pointer names a section-change marker of the active activity.
    Marker(String),
    /// The pointer names a group the active activity does not contain.
    Missing(String),
}

/// Outcome of [`Sequencer::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Advancing was not allowed; nothing changes.
    Stay,
    /// Move the pointer within the active activity.
    Move { uid: String },
    /// The active activity is exhausted: lock it and enter the next one.
    Fallthrough {
        locked: String,
        activity_index: usize,
        uid: String,
    },
    /// The active activity is exhausted and no unlocked activity follows.
    Exhausted { locked: String },
}

impl Transition {
    /// Pointer value after the transition, when it changes.
    pub fn target_uid(&self) -> Option<&str> {
        match self {
            Transition::Move { uid } | Transition::Fallthrough { uid, .. } => Some(uid),
            Transition::Stay | Transition::Exhausted { .. } => None,
        }
    }

    pub fn locked_activity(&self) -> Option<&str> {
        match self {
            Transition::Fallthrough { locked, .. } | Transition::Exhausted { locked } => {
                Some(locked)
            }
            Transition::Stay | Transition::Move { .. } => None,
        }
    }
}

pub struct Sequencer<'a> {
    activities: &'a [Activity],
    activity_index: usize,
    current_section: Option<&'a str>,
    ctx: VisibilityContext<'a>,
    groups: Vec<&'a QuestionGroup>,
}

impl<'a> Sequencer<'a> {
    pub fn new(
        activities: &'a [Activity],
        activity_index: usize,
        current_section: Option<&'a str>,
        ctx: VisibilityContext<'a>,
    ) -> Self {
        let groups = activities
            .get(activity_index)
            .map(|activity| activity.navigable().collect())
            .unwrap_or_default();
        Self {
            activities,
            activity_index,
            current_section,
            ctx,
            groups,
        }
    }

    pub fn activity(&self) -> Option<&'a Activity> {
        self.activities.get(self.activity_index)
    }

    /// Navigable groups of the active activity (section-change markers removed).
    pub fn groups(&self) -> &[&'a QuestionGroup] {
        &self.groups
    }

    pub fn current_index(&self) -> Option<usize> {
        let uid = self.current_section?;
        self.groups.iter().position(|group| group.uid == uid)
    }

    pub fn current_group(&self) -> Option<&'a QuestionGroup> {
        self.current_index().map(|index| self.groups[index])
    }

    pub fn position(&self) -> Position {
        let Some(uid) = self.current_section else {
            return Position::Unpositioned;
        };
        if let Some(index) = self.current_index() {
            return Position::At(index);
        }
        let is_marker = self
            .activity()
            .and_then(|activity| activity.group(uid))
            .is_some_and(QuestionGroup::is_section_change);
        if is_marker {
            Position::Marker(uid.to_string())
        } else {
            Position::Missing(uid.to_string())
        }
    }

    /// Groups to render: everything up to and including the current one,
    /// minus groups hidden by their rules.
    pub fn render_prefix(&self) -> Vec<&'a QuestionGroup> {
        match self.current_index() {
            Some(index) => self.groups[..=index]
                .iter()
                .copied()
                .filter(|group| self.ctx.is_visible(group))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Number of groups the user will see in this activity with the current answers.
    pub fn visible_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|group| self.ctx.is_visible(group))
            .count()
    }

    /// Whether no visible group follows the current position.
    pub fn is_last(&self) -> bool {
        self.next_visible(self.scan_start()).is_none()
    }

    /// Plans the move away from the current group.
    ///
    /// With `targets`, the first visible group (in list order) whose uid is a
    /// target wins; when none matches the move falls back to a single step.
    /// A single step skips groups hidden by their rules. Stepping past the
    /// last group locks the activity and enters the next unlocked one.
    pub fn advance(&self, allowed: bool, targets: &[String]) -> Transition {
        if !allowed {
            return Transition::Stay;
        }
        let Some(activity) = self.activity() else {
            return Transition::Stay;
        };

        if !targets.is_empty()
            && let Some(group) = self
                .groups
                .iter()
                .find(|group| targets.contains(&group.uid) && self.ctx.is_visible(group))
        {
            return Transition::Move {
                uid: group.uid.clone(),
            };
        }

        if let Some(group) = self.next_visible(self.scan_start()) {
            return Transition::Move {
                uid: group.uid.clone(),
            };
        }

        let next = self
            .activities
            .iter()
            .enumerate()
            .skip(self.activity_index + 1)
            .find(|(_, candidate)| !candidate.locked && candidate.navigable().next().is_some());

        match next {
            Some((activity_index, next)) => match entry_uid(next, &self.ctx) {
                Some(uid) => Transition::Fallthrough {
                    locked: activity.id.clone(),
                    activity_index,
                    uid: uid.to_string(),
                },
                None => Transition::Exhausted {
                    locked: activity.id.clone(),
                },
            },
            None => Transition::Exhausted {
                locked: activity.id.clone(),
            },
        }
    }

    fn scan_start(&self) -> usize {
        match self.position() {
            Position::At(index) => index + 1,
            Position::Unpositioned | Position::Missing(_) => 0,
            Position::Marker(uid) => self
                .activity()
                .map(|activity| {
                    activity
                        .questions
                        .iter()
                        .take_while(|group| group.uid != uid)
                        .filter(|group| !group.is_section_change())
                        .count()
                })
                .unwrap_or(0),
        }
    }

    fn next_visible(&self, start: usize) -> Option<&'a QuestionGroup> {
        self.groups
            .iter()
            .skip(start)
            .copied()
            .find(|group| self.ctx.is_visible(group))
    }
}

/// First group shown when entering `activity`: the first visible navigable
/// group, or the first navigable group when every one is hidden.
pub fn entry_uid<'a>(activity: &'a Activity, ctx: &VisibilityContext<'_>) -> Option<&'a str> {
    activity
        .navigable()
        .find(|group| ctx.is_visible(group))
        .or_else(|| activity.navigable().next())
        .map(|group| group.uid.as_str())
}
