#![allow(missing_docs)]

pub mod answers;
pub mod render;
pub mod resume;
pub mod sequencer;
pub mod spec;
pub mod state;
pub mod validate;
pub mod visibility;

pub use answers::{AnswerMap, AnswerOp, StagedAnswer, StagedAnswers};
pub use render::{
    RenderAction, RenderGroup, RenderPayload, RenderProgress, RenderStatus, build_render_payload,
    render_json_ui, render_text,
};
pub use resume::{Resumption, resume};
pub use sequencer::{Position, Sequencer, Transition, entry_uid};
pub use spec::{
    Action, ActionKind, Activity, ActivityMetadata, ActivityType, QuestionGroup, Rule, RuleError,
};
pub use state::{AssessmentState, StateAction};
pub use validate::{LintReport, ValidationError, lint, validate_group};
pub use visibility::{
    PathAssignments, PathCode, VisibilityContext, VisibilityMap, is_visible, resolve_visibility,
};
