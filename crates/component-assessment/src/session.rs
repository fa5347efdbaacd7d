use std::sync::Arc;

use assessment_spec::{
    AnswerMap, AnswerOp, AssessmentState, PathAssignments, Position, QuestionGroup, RenderPayload,
    Resumption, StagedAnswers, StateAction, Transition, build_render_payload, resume,
};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::collaborators::{
    Analytics, AnalyticsEvent, ErrorReporter, Notifier, TracingAnalytics, TracingNotifier,
    TracingReporter,
};
use crate::config::{RecoveryPolicy, SessionConfig};
use crate::controller::QuestionController;
use crate::error::{BackendError, SessionError};

/// One user's walk through the assessment.
///
/// Owns the page-level [`AssessmentState`] and is the only place that talks
/// to the backend; question controllers go through it to commit and advance.
pub struct AssessmentSession<B: Backend> {
    backend: B,
    config: SessionConfig,
    state: AssessmentState,
    analytics: Arc<dyn Analytics>,
    reporter: Arc<dyn ErrorReporter>,
    notifier: Arc<dyn Notifier>,
}

impl<B: Backend> AssessmentSession<B> {
    pub fn new(backend: B, config: SessionConfig) -> Self {
        Self {
            backend,
            config,
            state: AssessmentState::new(),
            analytics: Arc::new(TracingAnalytics),
            reporter: Arc::new(TracingReporter),
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn Analytics>) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &AssessmentState {
        &self.state
    }

    /// Fetches questions, answers and the persisted pointer, then positions
    /// the sequencer (resuming where the user left off).
    pub async fn load(&mut self) -> Result<(), SessionError> {
        let activities = self.backend.fetch_questions().await?;
        let assignments = self
            .config
            .assignments
            .unwrap_or_else(|| PathAssignments::from_activities(&activities));
        self.state.dispatch(StateAction::SetActivities(activities));
        self.state.dispatch(StateAction::SetAssignments(assignments));

        let answers = self.backend.fetch_answers().await?;
        self.state.dispatch(StateAction::AnswersLoaded(answers));

        let resumption = self.reposition().await?;
        if resumption == Resumption::Pending {
            return Ok(());
        }
        if let Resumption::Resume { uid, .. } = &resumption {
            self.track(AnalyticsEvent::AssessmentResumed, json!({ "uid": uid }));
        }

        self.state.dispatch(StateAction::MarkResumed);
        self.reconcile().await?;
        self.track(
            AnalyticsEvent::AssessmentLoaded,
            json!({
                "activities": self.state.activities().len(),
                "path": self.state.path_code().as_u8(),
            }),
        );
        Ok(())
    }

    /// Reads the persisted pointer and selects the activity and section it
    /// resolves to against the current question set.
    async fn reposition(&mut self) -> Result<Resumption, SessionError> {
        let persisted = self.backend.fetch_current_section().await?;
        let resumption = resume(
            self.state.activities(),
            persisted.as_deref(),
            self.state.answers_loaded(),
            &self.state.visibility(),
        );
        debug!(?resumption, ?persisted, "resolved starting point");

        match &resumption {
            Resumption::Start {
                activity_index,
                uid,
            } => {
                self.state.dispatch(StateAction::SelectActivity(*activity_index));
                self.state.dispatch(StateAction::SetCurrentSection(uid.clone()));
                if persisted.as_deref() != Some(uid.as_str()) {
                    self.persist_pointer(uid).await?;
                }
            }
            Resumption::Resume {
                activity_index,
                uid,
            } => {
                self.state.dispatch(StateAction::SelectActivity(*activity_index));
                self.state.dispatch(StateAction::SetCurrentSection(uid.clone()));
            }
            Resumption::Finished => {
                let last = self.state.activities().len().saturating_sub(1);
                self.state.dispatch(StateAction::SelectActivity(last));
                if let Some(uid) = persisted {
                    self.state.dispatch(StateAction::SetCurrentSection(uid));
                }
            }
            Resumption::Pending => {}
        }
        Ok(resumption)
    }

    /// Re-fetches the question set, keeping the current pointer.
    pub async fn resync_questions(&mut self) -> Result<(), SessionError> {
        let activities = self.backend.fetch_questions().await?;
        self.state.dispatch(StateAction::SetActivities(activities));
        Ok(())
    }

    /// Re-fetches the authoritative answers.
    pub async fn resync_answers(&mut self) -> Result<(), SessionError> {
        let answers = self.backend.fetch_answers().await?;
        self.state.dispatch(StateAction::AnswersLoaded(answers));
        Ok(())
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.sequencer().current_index()
    }

    pub fn current_group(&self) -> Option<&QuestionGroup> {
        self.state.sequencer().current_group()
    }

    pub fn current_uid(&self) -> Option<&str> {
        self.current_group().map(|group| group.uid.as_str())
    }

    pub fn is_visible(&self, group: &QuestionGroup) -> bool {
        self.state.is_visible(group)
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Controller for the group the user is currently answering.
    pub fn controller(&self) -> Option<QuestionController> {
        self.current_group()
            .map(|group| QuestionController::mount(group.clone(), true))
    }

    /// Controllers for every rendered group; only the last one is live.
    pub fn mount_prefix(&self) -> Vec<QuestionController> {
        let sequencer = self.state.sequencer();
        let current = sequencer.current_group().map(|group| group.uid.clone());
        sequencer
            .render_prefix()
            .into_iter()
            .map(|group| {
                let is_current = current.as_deref() == Some(group.uid.as_str());
                QuestionController::mount(group.clone(), is_current)
            })
            .collect()
    }

    /// Render payload for the current prefix; unknown action types are
    /// reported and left out.
    pub fn render(&self) -> RenderPayload {
        let payload = build_render_payload(&self.state);
        for kind in &payload.skipped_actions {
            warn!(kind = %kind, "skipping action of unknown type");
            self.reporter
                .report(&format!("unknown action type '{}'", kind));
        }
        payload
    }

    /// Moves the pointer and persists the move.
    pub async fn advance(
        &mut self,
        allowed: bool,
        targets: &[String],
    ) -> Result<Transition, SessionError> {
        self.ensure_loaded()?;
        let transition = self.state.sequencer().advance(allowed, targets);
        self.apply(transition.clone()).await?;
        Ok(transition)
    }

    /// Detects a pointer the active activity does not contain and repairs it
    /// by forcing an advance. Does nothing before resumption has run.
    pub async fn reconcile(&mut self) -> Result<Option<Transition>, SessionError> {
        if !self.state.resumed() || self.state.is_complete() {
            return Ok(None);
        }
        match self.state.sequencer().position() {
            Position::At(_) => return Ok(None),
            Position::Unpositioned => debug!("no section pointer; starting activity"),
            Position::Marker(uid) => debug!(%uid, "pointer on section marker; stepping past it"),
            Position::Missing(uid) => {
                let activity = self
                    .state
                    .active_activity()
                    .map(|activity| activity.id.as_str())
                    .unwrap_or("<none>");
                warn!(%uid, activity, "current section not found in active activity");
                self.reporter.report(&format!(
                    "invalid state: section '{}' is not part of activity '{}'",
                    uid, activity
                ));
                if self.config.recovery == RecoveryPolicy::Notify {
                    self.notifier.toast(&self.config.recovery_message);
                }
            }
        }
        self.advance(true, &[]).await.map(Some)
    }

    /// Saves staged answers for the active activity and merges them locally.
    ///
    /// A locked-activity rejection is not retried: the question set and the
    /// persisted pointer are fetched again, the session moves to wherever
    /// they now point and the user is told through a toast.
    pub(crate) async fn commit(&mut self, staged: &mut StagedAnswers) -> Result<(), SessionError> {
        self.ensure_loaded()?;
        let activity_id = self
            .state
            .active_activity()
            .map(|activity| activity.id.clone())
            .ok_or(SessionError::NotLoaded)?;
        let payload = staged.to_map();

        let response = self
            .backend
            .save_answers(&payload, false, Some(&activity_id))
            .await?;
        if response.is_activity_locked() {
            warn!(activity = %activity_id, "save rejected; activity is locked");
            self.resync_questions().await?;
            self.reposition().await?;
            self.reconcile().await?;
            self.notifier.toast(&self.config.locked_message);
            return Err(SessionError::ActivityLocked(activity_id));
        }
        if !response.is_success() {
            return Err(BackendError::Status {
                status: response.status,
                body: response.data,
            }
            .into());
        }

        let mut committed = AnswerMap::new();
        staged.flush_into(&mut committed);
        self.state.dispatch(StateAction::Answers(AnswerOp::Merge(committed)));
        if let Err(err) = self.resync_answers().await {
            warn!(error = %err, "answer resync failed; keeping local copy");
        }
        Ok(())
    }

    pub(crate) fn track(&self, event: AnalyticsEvent, payload: Value) {
        self.analytics.track(event, payload);
    }

    async fn apply(&mut self, transition: Transition) -> Result<(), SessionError> {
        match &transition {
            Transition::Stay => return Ok(()),
            Transition::Move { uid } => debug!(%uid, "moving to question"),
            Transition::Fallthrough {
                locked,
                activity_index,
                uid,
            } => {
                info!(%locked, next = activity_index, %uid, "activity complete");
                self.backend.lock_activity(locked).await?;
                self.track(AnalyticsEvent::ActivityCompleted, json!({ "activity": locked }));
            }
            Transition::Exhausted { locked } => {
                info!(%locked, "final activity complete");
                self.backend.lock_activity(locked).await?;
                self.track(AnalyticsEvent::ActivityCompleted, json!({ "activity": locked }));
            }
        }

        let target = transition.target_uid().map(String::from);
        self.state.dispatch(StateAction::Apply(transition));
        if let Some(uid) = target {
            self.persist_pointer(&uid).await?;
        }
        if self.state.is_complete() {
            info!("assessment complete");
            self.track(AnalyticsEvent::AssessmentCompleted, json!({}));
        }
        Ok(())
    }

    async fn persist_pointer(&self, uid: &str) -> Result<(), SessionError> {
        let activity_id = self
            .state
            .active_activity()
            .map(|activity| activity.id.as_str());
        self.backend
            .set_current_section_uid(activity_id, uid)
            .await?;
        Ok(())
    }

    fn ensure_loaded(&self) -> Result<(), SessionError> {
        if self.state.activities().is_empty() {
            Err(SessionError::NotLoaded)
        } else {
            Ok(())
        }
    }
}
