//! Per-session tracker for an external operation (AI call, export).
//!
//! `Idle → InFlight → Succeeded | Failed`. A second start while in flight is
//! rejected, never queued. Trigger controls derive their enabled flag from
//! `is_in_flight`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationStatus {
    Idle,
    InFlight {
        operation: &'static str,
        started_at: DateTime<Utc>,
    },
    Succeeded {
        operation: &'static str,
    },
    Failed {
        operation: &'static str,
        reason: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("'{running}' is already in progress")]
pub struct OperationBusy {
    pub running: &'static str,
}

#[derive(Debug, Clone)]
pub struct OperationTracker {
    status: OperationStatus,
}

impl Default for OperationTracker {
    fn default() -> Self {
        Self {
            status: OperationStatus::Idle,
        }
    }
}

impl OperationTracker {
    pub fn status(&self) -> &OperationStatus {
        &self.status
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.status, OperationStatus::InFlight { .. })
    }

    /// Marks `operation` as started. Fails if anything is already in flight.
    pub fn begin(&mut self, operation: &'static str) -> Result<(), OperationBusy> {
        if let OperationStatus::InFlight { operation: running, .. } = self.status {
            return Err(OperationBusy { running });
        }
        self.status = OperationStatus::InFlight {
            operation,
            started_at: Utc::now(),
        };
        Ok(())
    }

    pub fn succeed(&mut self) {
        if let OperationStatus::InFlight { operation, .. } = self.status {
            self.status = OperationStatus::Succeeded { operation };
        }
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        if let OperationStatus::InFlight { operation, .. } = self.status {
            self.status = OperationStatus::Failed {
                operation,
                reason: reason.into(),
            };
        }
    }
}
