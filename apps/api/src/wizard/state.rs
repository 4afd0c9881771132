//! Wizard state machine: Identity → Project → Review.
//!
//! Forward moves are gated on validating the step being left; backward moves
//! never validate and never discard data. There is no way to skip a step.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ProjectInfo, ProjectPatch, StudentInfo, StudentPatch};
use crate::validation::{validate_project, validate_student, Field, ValidationReport};

/// The three ordered wizard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Identity,
    Project,
    Review,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::Identity, Step::Project, Step::Review];

    /// One-based position, as shown in the step indicator.
    pub fn number(&self) -> u8 {
        match self {
            Step::Identity => 1,
            Step::Project => 2,
            Step::Review => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::Identity => "Identité",
            Step::Project => "Projet",
            Step::Review => "Validation",
        }
    }

    pub fn next(&self) -> Option<Step> {
        match self {
            Step::Identity => Some(Step::Project),
            Step::Project => Some(Step::Review),
            Step::Review => None,
        }
    }

    pub fn previous(&self) -> Option<Step> {
        match self {
            Step::Identity => None,
            Step::Project => Some(Step::Identity),
            Step::Review => Some(Step::Project),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Review)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Step::Identity => "identity",
            Step::Project => "project",
            Step::Review => "review",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("step '{step}' has {} invalid field(s)", .report.error_count())]
    Invalid { step: Step, report: ValidationReport },

    #[error("'{0}' is the final step")]
    NoNextStep(Step),

    #[error("'{0}' is the first step")]
    NoPreviousStep(Step),

    #[error("cannot edit {target} fields while at step '{current}'")]
    WrongStep { target: Step, current: Step },
}

// ────────────────────────────────────────────────────────────────────────────
// Step indicator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Current,
    Upcoming,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepBadge {
    pub step: Step,
    pub number: u8,
    pub label: &'static str,
    pub status: StepStatus,
}

// ────────────────────────────────────────────────────────────────────────────
// Wizard state
// ────────────────────────────────────────────────────────────────────────────

/// Current step plus the two records it exclusively owns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WizardState {
    pub step: Step,
    pub student: StudentInfo,
    pub project: ProjectInfo,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the step the user is on. The review step has nothing to validate.
    pub fn validate_current(&self) -> ValidationReport {
        match self.step {
            Step::Identity => validate_student(&self.student),
            Step::Project => validate_project(&self.project),
            Step::Review => ValidationReport::default(),
        }
    }

    /// Moves one step forward if the current step validates.
    pub fn advance(&mut self) -> Result<Step, WizardError> {
        let next = self.step.next().ok_or(WizardError::NoNextStep(self.step))?;
        let report = self.validate_current();
        if !report.is_valid() {
            return Err(WizardError::Invalid {
                step: self.step,
                report,
            });
        }
        self.step = next;
        Ok(next)
    }

    /// Moves one step back. No validation, no data loss.
    pub fn retreat(&mut self) -> Result<Step, WizardError> {
        let previous = self
            .step
            .previous()
            .ok_or(WizardError::NoPreviousStep(self.step))?;
        self.step = previous;
        Ok(previous)
    }

    fn require_step(&self, target: Step) -> Result<(), WizardError> {
        if self.step == target {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                target,
                current: self.step,
            })
        }
    }

    /// Applies an identity edit. Returns the fields that were touched.
    pub fn edit_student(&mut self, patch: StudentPatch) -> Result<Vec<Field>, WizardError> {
        self.require_step(Step::Identity)?;

        let mut touched = Vec::new();
        let student = &mut self.student;
        for (field, slot, value) in [
            (Field::FirstName, &mut student.first_name, patch.first_name),
            (Field::LastName, &mut student.last_name, patch.last_name),
            (Field::Email, &mut student.email, patch.email),
            (Field::Phone, &mut student.phone, patch.phone),
            (Field::Major, &mut student.major, patch.major),
        ] {
            if let Some(value) = value {
                *slot = value;
                touched.push(field);
            }
        }
        Ok(touched)
    }

    /// Applies a project edit. Returns the fields that were touched.
    pub fn edit_project(&mut self, patch: ProjectPatch) -> Result<Vec<Field>, WizardError> {
        self.require_step(Step::Project)?;

        let mut touched = Vec::new();
        if let Some(topic) = patch.topic {
            self.project.topic = topic;
            touched.push(Field::Topic);
        }
        if let Some(general) = patch.general_objective {
            self.project.general_objective = general;
            touched.push(Field::GeneralObjective);
        }
        if let Some(objectives) = patch.specific_objectives {
            for (index, value) in objectives.into_iter().enumerate() {
                if let Some(value) = value {
                    self.project.specific_objectives[index] = value;
                    touched.push(Field::SpecificObjective(index));
                }
            }
        }
        Ok(touched)
    }

    /// Replaces the project record wholesale with an AI-assisted version.
    ///
    /// Only legal while still on the project step: a result that arrives after
    /// the user has moved on is dropped rather than bypassing validation.
    pub fn replace_project(&mut self, project: ProjectInfo) -> Result<(), WizardError> {
        self.require_step(Step::Project)?;
        self.project = project;
        Ok(())
    }

    pub fn step_badges(&self) -> Vec<StepBadge> {
        let current = self.step.number();
        Step::ALL
            .iter()
            .map(|step| StepBadge {
                step: *step,
                number: step.number(),
                label: step.label(),
                status: match step.number() {
                    n if n < current => StepStatus::Completed,
                    n if n == current => StepStatus::Current,
                    _ => StepStatus::Upcoming,
                },
            })
            .collect()
    }
}
