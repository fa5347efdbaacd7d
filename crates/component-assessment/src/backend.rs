use std::sync::{Mutex, MutexGuard};

use assessment_spec::{Activity, AnswerMap, AnswerOp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::BackendError;

const ACTIVITY_LOCKED: &str = "activity is locked";

/// Raw outcome of a save call.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveResponse {
    pub status: u16,
    pub data: Value,
}

impl SaveResponse {
    pub fn ok(data: Value) -> Self {
        Self { status: 200, data }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `400` whose `nonFieldErrors` mention a locked activity.
    pub fn is_activity_locked(&self) -> bool {
        self.status == 400
            && self
                .data
                .get("nonFieldErrors")
                .and_then(Value::as_array)
                .is_some_and(|errors| {
                    errors.iter().filter_map(Value::as_str).any(|error| {
                        error.to_ascii_lowercase().contains(ACTIVITY_LOCKED)
                    })
                })
    }
}

/// Source of truth for questions, answers and the section pointer.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_questions(&self) -> Result<Vec<Activity>, BackendError>;

    async fn fetch_answers(&self) -> Result<AnswerMap, BackendError>;

    async fn fetch_current_section(&self) -> Result<Option<String>, BackendError>;

    async fn save_answers(
        &self,
        answers: &AnswerMap,
        full_replace: bool,
        activity_id: Option<&str>,
    ) -> Result<SaveResponse, BackendError>;

    async fn lock_activity(&self, activity_id: &str) -> Result<(), BackendError>;

    async fn set_current_section_uid(
        &self,
        activity_id: Option<&str>,
        uid: &str,
    ) -> Result<(), BackendError>;
}

/// Everything a backend stores for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSnapshot {
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub answers: AnswerMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_section: Option<String>,
}

/// Backend kept in process memory; used by the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: Mutex<AssessmentSnapshot>,
}

impl MemoryBackend {
    pub fn new(snapshot: AssessmentSnapshot) -> Self {
        Self {
            store: Mutex::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> Result<AssessmentSnapshot, BackendError> {
        Ok(self.store()?.clone())
    }

    /// Mutates the stored data directly, bypassing the save rules.
    pub fn update(&self, f: impl FnOnce(&mut AssessmentSnapshot)) -> Result<(), BackendError> {
        let mut store = self.store()?;
        f(&mut store);
        Ok(())
    }

    fn store(&self) -> Result<MutexGuard<'_, AssessmentSnapshot>, BackendError> {
        self.store
            .lock()
            .map_err(|_| BackendError::Transport("memory store poisoned".into()))
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn fetch_questions(&self) -> Result<Vec<Activity>, BackendError> {
        Ok(self.store()?.activities.clone())
    }

    async fn fetch_answers(&self) -> Result<AnswerMap, BackendError> {
        Ok(self.store()?.answers.clone())
    }

    async fn fetch_current_section(&self) -> Result<Option<String>, BackendError> {
        Ok(self.store()?.current_section.clone())
    }

    async fn save_answers(
        &self,
        answers: &AnswerMap,
        full_replace: bool,
        activity_id: Option<&str>,
    ) -> Result<SaveResponse, BackendError> {
        let mut store = self.store()?;
        let locked = activity_id.is_some_and(|id| {
            store
                .activities
                .iter()
                .any(|activity| activity.id == id && activity.locked)
        });
        if locked {
            return Ok(SaveResponse {
                status: 400,
                data: json!({ "nonFieldErrors": ["Activity is locked."] }),
            });
        }

        let op = if full_replace {
            AnswerOp::Replace(answers.clone())
        } else {
            AnswerOp::Merge(answers.clone())
        };
        store.answers.apply(op);
        Ok(SaveResponse::ok(store.answers.to_value()))
    }

    async fn lock_activity(&self, activity_id: &str) -> Result<(), BackendError> {
        let mut store = self.store()?;
        if let Some(activity) = store
            .activities
            .iter_mut()
            .find(|activity| activity.id == activity_id)
        {
            activity.locked = true;
        }
        Ok(())
    }

    async fn set_current_section_uid(
        &self,
        _activity_id: Option<&str>,
        uid: &str,
    ) -> Result<(), BackendError> {
        self.store()?.current_section = Some(uid.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_response_is_detected() {
        let response = SaveResponse {
            status: 400,
            data: json!({ "nonFieldErrors": ["Activity is locked."] }),
        };
        assert!(response.is_activity_locked());
        assert!(!response.is_success());

        let other = SaveResponse {
            status: 400,
            data: json!({ "nonFieldErrors": ["answer too long"] }),
        };
        assert!(!other.is_activity_locked());
    }

    #[test]
    fn update_mutates_the_stored_snapshot() {
        let backend = MemoryBackend::default();
        backend
            .update(|store| store.current_section = Some("s1".into()))
            .expect("update");
        let snapshot = backend.snapshot().expect("snapshot");
        assert_eq!(snapshot.current_section.as_deref(), Some("s1"));
    }
}
