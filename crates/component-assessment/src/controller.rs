use assessment_spec::{QuestionGroup, StagedAnswers, Transition};
use serde_json::{Value, json};
use tracing::debug;

use crate::backend::Backend;
use crate::collaborators::AnalyticsEvent;
use crate::error::SessionError;
use crate::session::AssessmentSession;
use crate::validator::{ActionValidator, Validator};

/// Local state of one rendered question group.
///
/// Edits are staged here and only reach the session's answers when the group
/// is submitted, so a half-filled question never leaks into the shared map.
pub struct QuestionController {
    group: QuestionGroup,
    answered: bool,
    is_valid: bool,
    show_validation: bool,
    validation_message: Option<String>,
    submission_in_progress: bool,
    staged: StagedAnswers,
    validator: Option<Box<dyn Validator>>,
}

impl QuestionController {
    /// Groups other than the current one mount already answered and render
    /// as a read-only summary.
    pub fn mount(group: QuestionGroup, is_current: bool) -> Self {
        let validator = ActionValidator::for_group(&group)
            .map(|validator| Box::new(validator) as Box<dyn Validator>);
        Self {
            group,
            answered: !is_current,
            is_valid: true,
            show_validation: false,
            validation_message: None,
            submission_in_progress: false,
            staged: StagedAnswers::new(),
            validator,
        }
    }

    pub fn group(&self) -> &QuestionGroup {
        &self.group
    }

    pub fn uid(&self) -> &str {
        &self.group.uid
    }

    pub fn answered(&self) -> bool {
        self.answered
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn show_validation(&self) -> bool {
        self.show_validation
    }

    pub fn validation_message(&self) -> Option<&str> {
        self.validation_message.as_deref()
    }

    pub fn submission_in_progress(&self) -> bool {
        self.submission_in_progress
    }

    pub fn staged(&self) -> &StagedAnswers {
        &self.staged
    }

    /// Buffers an edit made by one of the group's actions.
    pub fn stage(&mut self, key: impl Into<String>, value: Value) {
        self.staged.stage(key, value);
    }

    /// Value an action should display: the staged edit, else the committed answer.
    pub fn value<'a, B: Backend>(
        &'a self,
        session: &'a AssessmentSession<B>,
        key: &str,
    ) -> Option<&'a Value> {
        self.staged
            .get(key)
            .or_else(|| session.state().answers().get(key))
    }

    /// Installs the single validation check, replacing any earlier one.
    pub fn register_validator(&mut self, validator: impl Validator + 'static) {
        self.validator = Some(Box::new(validator));
    }

    pub fn clear_validator(&mut self) {
        self.validator = None;
    }

    /// Validate, commit the staged answers, then advance.
    ///
    /// `goto` carries the branch targets of the option the user picked. A
    /// rejected validation leaves the group unanswered with its message set.
    pub async fn submit<B: Backend>(
        &mut self,
        session: &mut AssessmentSession<B>,
        goto: Option<&[String]>,
    ) -> Result<Transition, SessionError> {
        if session.current_uid() != Some(self.uid()) {
            return Err(SessionError::NotCurrent(self.group.uid.clone()));
        }
        if self.submission_in_progress {
            return Err(SessionError::SubmissionInProgress(self.group.uid.clone()));
        }

        let mut in_flight = InFlight::begin(self);
        in_flight.0.run_submission(session, goto).await
    }

    /// Advances past the group without surfacing it when its rules hide it.
    pub async fn skip_if_hidden<B: Backend>(
        &mut self,
        session: &mut AssessmentSession<B>,
    ) -> Result<Option<Transition>, SessionError> {
        if session.is_visible(&self.group) || session.current_uid() != Some(self.uid()) {
            return Ok(None);
        }
        debug!(uid = %self.group.uid, "skipping hidden question");
        self.answered = true;
        self.staged.clear();
        session.track(AnalyticsEvent::QuestionSkipped, json!({ "uid": self.group.uid }));
        session.advance(true, &[]).await.map(Some)
    }

    async fn run_submission<B: Backend>(
        &mut self,
        session: &mut AssessmentSession<B>,
        goto: Option<&[String]>,
    ) -> Result<Transition, SessionError> {
        if let Some(validator) = &self.validator {
            let candidate = session.state().answers().overlaid(&self.staged.to_map());
            if let Err(rejection) = validator.validate(&candidate).await {
                self.is_valid = false;
                self.show_validation = true;
                self.validation_message = Some(rejection.message.clone());
                session.track(
                    AnalyticsEvent::ValidationFailed,
                    json!({ "uid": self.group.uid, "message": rejection.message }),
                );
                return Err(SessionError::Validation(rejection.message));
            }
            self.is_valid = true;
            self.show_validation = false;
            self.validation_message = None;
        }

        if !self.staged.is_empty() {
            session.commit(&mut self.staged).await?;
        }
        self.answered = true;
        session.track(
            AnalyticsEvent::QuestionAnswered,
            json!({ "uid": self.group.uid }),
        );
        session.advance(true, goto.unwrap_or(&[])).await
    }
}

/// Holds the in-progress flag for one submission; clears it on drop so a
/// cancelled submit does not wedge the controller.
struct InFlight<'a>(&'a mut QuestionController);

impl<'a> InFlight<'a> {
    fn begin(controller: &'a mut QuestionController) -> Self {
        controller.submission_in_progress = true;
        Self(controller)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.submission_in_progress = false;
    }
}
