use std::fs;
use std::path::Path;

use component_assessment::{AssessmentSession, AssessmentSnapshot, MemoryBackend, SessionConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::CliResult;

/// On-disk form of one user's assessment: the backend snapshot plus the
/// session config. A bare array is read as a fresh question set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateFile {
    #[serde(flatten)]
    pub snapshot: AssessmentSnapshot,
    #[serde(default)]
    pub config: SessionConfig,
}

impl StateFile {
    pub fn read(path: &Path) -> CliResult<Self> {
        let contents = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        if value.is_array() {
            return Ok(Self {
                snapshot: AssessmentSnapshot {
                    activities: serde_json::from_value(value)?,
                    ..AssessmentSnapshot::default()
                },
                config: SessionConfig::default(),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn write(&self, path: &Path) -> CliResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, format!("{}\n", json))?;
        Ok(())
    }

    pub fn open_session(&self) -> AssessmentSession<MemoryBackend> {
        AssessmentSession::new(
            MemoryBackend::new(self.snapshot.clone()),
            self.config.clone(),
        )
    }

    /// Writes what the session's backend currently holds.
    pub fn save_session(
        &mut self,
        path: &Path,
        session: &AssessmentSession<MemoryBackend>,
    ) -> CliResult<()> {
        self.snapshot = session.backend().snapshot()?;
        self.write(path)?;
        debug!(path = %path.display(), section = ?self.snapshot.current_section, "state saved");
        Ok(())
    }
}
