//! Fire-and-forget collaborators: analytics, error reporting and toasts.
//! None of them may block or fail the caller.

use serde_json::Value;
use tracing::{error, info, warn};

/// Names of the analytics events the session emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsEvent {
    AssessmentLoaded,
    AssessmentResumed,
    QuestionAnswered,
    QuestionSkipped,
    ValidationFailed,
    ActivityCompleted,
    AssessmentCompleted,
}

impl AnalyticsEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsEvent::AssessmentLoaded => "assessment_loaded",
            AnalyticsEvent::AssessmentResumed => "assessment_resumed",
            AnalyticsEvent::QuestionAnswered => "question_answered",
            AnalyticsEvent::QuestionSkipped => "question_skipped",
            AnalyticsEvent::ValidationFailed => "validation_failed",
            AnalyticsEvent::ActivityCompleted => "activity_completed",
            AnalyticsEvent::AssessmentCompleted => "assessment_completed",
        }
    }
}

pub trait Analytics: Send + Sync {
    fn track(&self, event: AnalyticsEvent, payload: Value);
}

/// Receives diagnostics for invalid states and unknown action types.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, message: &str);
}

/// Shows a user-facing toast.
pub trait Notifier: Send + Sync {
    fn toast(&self, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

impl Analytics for TracingAnalytics {
    fn track(&self, event: AnalyticsEvent, payload: Value) {
        info!(event = event.as_str(), %payload, "analytics");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, message: &str) {
        error!(report = message, "error reported");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn toast(&self, message: &str) {
        warn!(toast = message, "user notified");
    }
}
