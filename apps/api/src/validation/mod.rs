//! Field validators for the two data-entry steps.
//!
//! Each validator is a pure function of the field value. Step validation
//! collects every failing field in one pass so the caller can show all
//! errors at once instead of stopping at the first one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::models::{ProjectInfo, StudentInfo, SPECIFIC_OBJECTIVE_COUNT};

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+\s-]{8,}$").expect("valid phone regex"));

/// Minimum topic length (in characters) before the AI assist may draft objectives.
pub const MIN_SUGGEST_TOPIC_CHARS: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Field identifiers
// ────────────────────────────────────────────────────────────────────────────

/// Every editable field of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Phone,
    Major,
    Topic,
    GeneralObjective,
    /// Zero-based slot index.
    SpecificObjective(usize),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::FirstName => write!(f, "first_name"),
            Field::LastName => write!(f, "last_name"),
            Field::Email => write!(f, "email"),
            Field::Phone => write!(f, "phone"),
            Field::Major => write!(f, "major"),
            Field::Topic => write!(f, "topic"),
            Field::GeneralObjective => write!(f, "general_objective"),
            Field::SpecificObjective(i) => write!(f, "specific_objectives[{i}]"),
        }
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single rejected field with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation report
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of validating one wizard step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: BTreeMap<Field, String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[cfg(test)]
    pub fn has_error(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    fn check(&mut self, field: Field, result: Result<(), String>) {
        if let Err(message) = result {
            self.errors.insert(field, message);
        }
    }

    /// Errors in field order.
    pub fn field_errors(&self) -> Vec<FieldError> {
        self.errors
            .iter()
            .map(|(field, message)| FieldError {
                field: *field,
                message: message.clone(),
            })
            .collect()
    }

    pub fn into_map(self) -> BTreeMap<Field, String> {
        self.errors
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Single-field validators
// ────────────────────────────────────────────────────────────────────────────

/// Rejects empty and whitespace-only text.
pub fn validate_required(value: &str, message: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(message.to_string())
    } else {
        Ok(())
    }
}

/// Accepts the minimal `local@domain.tld` shape.
pub fn validate_email(value: &str) -> Result<(), String> {
    if EMAIL_REGEX.is_match(value.trim()) {
        Ok(())
    } else {
        Err("Adresse email invalide.".to_string())
    }
}

/// At least 8 characters, all drawn from digits, spaces, `+` and `-`.
pub fn validate_phone(value: &str) -> Result<(), String> {
    if PHONE_REGEX.is_match(value.trim()) {
        Ok(())
    } else {
        Err("Numéro de téléphone invalide (min 8 chiffres).".to_string())
    }
}

/// Precondition of the AI "suggest" operation.
pub fn validate_suggest_topic(topic: &str) -> Result<(), String> {
    if topic.trim().chars().count() < MIN_SUGGEST_TOPIC_CHARS {
        Err(format!(
            "Le sujet doit contenir au moins {MIN_SUGGEST_TOPIC_CHARS} caractères pour générer des objectifs."
        ))
    } else {
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Step validators
// ────────────────────────────────────────────────────────────────────────────

/// Validates the identity step. Reports every malformed field.
pub fn validate_student(student: &StudentInfo) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.check(
        Field::FirstName,
        validate_required(&student.first_name, "Le prénom est requis."),
    );
    report.check(
        Field::LastName,
        validate_required(&student.last_name, "Le nom est requis."),
    );
    report.check(Field::Email, validate_email(&student.email));
    report.check(Field::Phone, validate_phone(&student.phone));
    report.check(
        Field::Major,
        validate_required(&student.major, "La filière est requise."),
    );
    report
}

/// Validates the project step. Each specific objective is checked on its own.
pub fn validate_project(project: &ProjectInfo) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.check(
        Field::Topic,
        validate_required(&project.topic, "Le sujet est requis."),
    );
    report.check(
        Field::GeneralObjective,
        validate_required(&project.general_objective, "L'objectif général est requis."),
    );
    for (index, objective) in project.specific_objectives.iter().enumerate() {
        report.check(
            Field::SpecificObjective(index),
            validate_required(
                objective,
                &format!(
                    "L'objectif spécifique {} est requis ({SPECIFIC_OBJECTIVE_COUNT} requis).",
                    index + 1
                ),
            ),
        );
    }
    report
}
