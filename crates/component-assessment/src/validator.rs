use assessment_spec::{AnswerMap, QuestionGroup, validate_group};
use async_trait::async_trait;

/// Why a question refused to advance; shown inline to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub message: String,
}

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Check run by a question controller before it commits its answers.
///
/// `answers` is the committed answer map with the staged edits on top.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, answers: &AnswerMap) -> Result<(), Rejection>;
}

/// Validator derived from the actions of a group that gate their advance.
#[derive(Debug, Clone)]
pub struct ActionValidator {
    group: QuestionGroup,
}

impl ActionValidator {
    pub fn for_group(group: &QuestionGroup) -> Option<Self> {
        group
            .actions
            .iter()
            .any(|action| action.requires_validation())
            .then(|| Self {
                group: group.clone(),
            })
    }
}

#[async_trait]
impl Validator for ActionValidator {
    async fn validate(&self, answers: &AnswerMap) -> Result<(), Rejection> {
        match validate_group(&self.group, answers).into_iter().next() {
            Some(error) => Err(Rejection::new(error.message)),
            None => Ok(()),
        }
    }
}
