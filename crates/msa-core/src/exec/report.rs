//! Reporte agregado de una corrida.
//!
//! Los errores por trabajo no abortan la corrida; se acumulan aquí y se
//! reportan al final. El reporte serializa a JSON para inspección.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::graph::job::{JobKey, JobStatus};

/// Resultado terminal de un trabajo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    pub key: JobKey,
    pub status: JobStatus,
    /// Texto del error para Failed; clave del trabajo culpable para Blocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Un outcome por trabajo del grafo, en orden canónico de clave.
    pub outcomes: Vec<JobOutcome>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, JobStatus::Failed | JobStatus::Blocked))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// (done, skipped, failed, blocked)
    pub fn summary(&self) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for o in &self.outcomes {
            match o.status {
                JobStatus::Done => counts.0 += 1,
                JobStatus::Skipped => counts.1 += 1,
                JobStatus::Failed => counts.2 += 1,
                JobStatus::Blocked => counts.3 += 1,
                _ => {}
            }
        }
        counts
    }
}
