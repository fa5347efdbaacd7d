pub mod backend;
pub mod collaborators;
pub mod config;
pub mod controller;
pub mod error;
pub mod session;
pub mod validator;

pub use backend::{AssessmentSnapshot, Backend, MemoryBackend, SaveResponse};
pub use collaborators::{
    Analytics, AnalyticsEvent, ErrorReporter, Notifier, TracingAnalytics, TracingNotifier,
    TracingReporter,
};
pub use config::{RecoveryPolicy, SessionConfig};
pub use controller::QuestionController;
pub use error::{BackendError, SessionError};
pub use session::AssessmentSession;
pub use validator::{ActionValidator, Rejection, Validator};
