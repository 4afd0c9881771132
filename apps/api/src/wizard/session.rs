//! In-memory wizard sessions, one per browser tab.
//!
//! The store lock is only ever held for synchronous mutation; handlers that
//! wait on an external call snapshot what they need, release, await, and
//! re-enter to apply the outcome.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ProjectInfo, ProjectPatch, StudentInfo, StudentPatch};
use crate::validation::{Field, FieldError};
use crate::wizard::operation::{OperationStatus, OperationTracker};
use crate::wizard::state::{Step, StepBadge, WizardError, WizardState};

/// Which triggers the front end should enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub next: bool,
    pub back: bool,
    pub suggest: bool,
    pub improve: bool,
    pub export: bool,
}

/// Everything the front end needs to render the current step.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub step: Step,
    pub steps: Vec<StepBadge>,
    pub student: StudentInfo,
    pub project: ProjectInfo,
    pub errors: Vec<FieldError>,
    pub assist: OperationStatus,
    pub export: OperationStatus,
    pub ai_available: bool,
    pub controls: Controls,
}

#[derive(Debug)]
pub struct WizardSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub state: WizardState,
    /// Errors from the last rejected "next"; cleared per field on edit.
    pub errors: BTreeMap<Field, String>,
    /// Shared by suggest and improve so only one AI call runs at a time.
    pub assist: OperationTracker,
    pub export: OperationTracker,
}

impl WizardSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            state: WizardState::new(),
            errors: BTreeMap::new(),
            assist: OperationTracker::default(),
            export: OperationTracker::default(),
        }
    }

    /// Advances, or records every field error of the rejected step.
    pub fn next(&mut self) -> Result<Step, WizardError> {
        match self.state.advance() {
            Ok(step) => {
                self.errors.clear();
                Ok(step)
            }
            Err(WizardError::Invalid { step, report }) => {
                self.errors = report.clone().into_map();
                Err(WizardError::Invalid { step, report })
            }
            Err(e) => Err(e),
        }
    }

    pub fn back(&mut self) -> Result<Step, WizardError> {
        let step = self.state.retreat()?;
        self.errors.clear();
        Ok(step)
    }

    pub fn edit_student(&mut self, patch: StudentPatch) -> Result<(), WizardError> {
        let touched = self.state.edit_student(patch)?;
        self.clear_errors(&touched);
        Ok(())
    }

    pub fn edit_project(&mut self, patch: ProjectPatch) -> Result<(), WizardError> {
        let touched = self.state.edit_project(patch)?;
        self.clear_errors(&touched);
        Ok(())
    }

    /// Swaps in an AI-produced project record. Stored errors no longer describe it.
    pub fn replace_project(&mut self, project: ProjectInfo) -> Result<(), WizardError> {
        self.state.replace_project(project)?;
        self.errors.clear();
        Ok(())
    }

    /// Errors are cleared as fields are edited, never re-validated until the next submit.
    fn clear_errors(&mut self, touched: &[Field]) {
        for field in touched {
            self.errors.remove(field);
        }
    }

    pub fn controls(&self) -> Controls {
        let step = self.state.step;
        let assist_idle = !self.assist.is_in_flight();
        Controls {
            next: !step.is_terminal(),
            back: step.previous().is_some(),
            suggest: step == Step::Project && assist_idle,
            improve: step == Step::Project && assist_idle,
            export: step == Step::Review && !self.export.is_in_flight(),
        }
    }

    pub fn view(&self, ai_available: bool) -> SessionView {
        SessionView {
            session_id: self.id,
            created_at: self.created_at,
            step: self.state.step,
            steps: self.state.step_badges(),
            student: self.state.student.clone(),
            project: self.state.project.clone(),
            errors: self
                .errors
                .iter()
                .map(|(field, message)| FieldError {
                    field: *field,
                    message: message.clone(),
                })
                .collect(),
            assist: self.assist.status().clone(),
            export: self.export.status().clone(),
            ai_available,
            controls: self.controls(),
        }
    }
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

/// All live sessions. Nothing is persisted; a restart discards everything.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, WizardSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh session at the identity step and returns a closure's view of it.
    pub async fn create<R>(&self, f: impl FnOnce(&WizardSession) -> R) -> R {
        let session = WizardSession::new();
        let out = f(&session);
        info!(session_id = %session.id, "Wizard session created");
        self.sessions.write().await.insert(session.id, session);
        out
    }

    /// Runs `f` against the session under the store lock. `f` must not block.
    pub async fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut WizardSession) -> R,
    ) -> Result<R, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        Ok(f(session))
    }

    /// Ends a session. Returns false if it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Wizard session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
