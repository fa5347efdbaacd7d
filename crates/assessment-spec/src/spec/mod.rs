pub mod action;
pub mod activity;
pub mod group;
pub mod rule;

pub use action::{Action, ActionKind, ButtonOption, ChoiceOption, UnknownAction};
pub use activity::{Activity, ActivityMetadata, ActivityType};
pub use group::QuestionGroup;
pub use rule::{Rule, RuleError};
