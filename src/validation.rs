//! Validation System - Rule/Policy Separation
//!
//! Rules produce structured violations. The validator collects them so
//! every offending field can be flagged at once.

use serde::{Deserialize, Serialize};

use crate::date::parse_ddmmyy;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

/// Request fields a violation can point at
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ProjectName,
    Revision,
    FinishDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub field: Field,
    pub severity: ViolationSeverity,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    /// Fields a form should highlight, in request order, without duplicates
    pub fn flagged_fields(&self) -> Vec<Field> {
        let mut fields: Vec<Field> = vec![];
        for v in &self.violations {
            if !fields.contains(&v.field) {
                fields.push(v.field);
            }
        }
        fields.sort_by_key(|f| *f as u8);
        fields
    }
}

/// Raw form input for one generation action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceRequest {
    pub project_name: String,
    pub revision: String,
    #[serde(default)]
    pub finish_date: String,
    #[serde(default)]
    pub use_current_date: bool,
}

impl IssuanceRequest {
    pub fn new(
        project_name: impl Into<String>,
        revision: impl Into<String>,
        finish_date: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            revision: revision.into(),
            finish_date: finish_date.into(),
            use_current_date: false,
        }
    }

    /// Request stamped with today's date instead of a typed one
    pub fn dated_today(project_name: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            revision: revision.into(),
            finish_date: String::new(),
            use_current_date: true,
        }
    }

    /// Copy with surrounding whitespace stripped from every text field
    pub fn trimmed(&self) -> Self {
        Self {
            project_name: self.project_name.trim().to_string(),
            revision: self.revision.trim().to_string(),
            finish_date: self.finish_date.trim().to_string(),
            use_current_date: self.use_current_date,
        }
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, request: &IssuanceRequest) -> Vec<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct RequiredFieldsRule;

impl ValidationRule for RequiredFieldsRule {
    fn name(&self) -> &'static str { "required_fields" }

    fn validate(&self, request: &IssuanceRequest) -> Vec<ValidationViolation> {
        let mut checks = vec![
            (Field::ProjectName, &request.project_name),
            (Field::Revision, &request.revision),
        ];
        if !request.use_current_date {
            checks.push((Field::FinishDate, &request.finish_date));
        }

        checks
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| ValidationViolation {
                rule: self.name().to_string(),
                field,
                severity: ViolationSeverity::Error,
                message: "Required field is empty".to_string(),
            })
            .collect()
    }
}

pub struct FinishDateRule;

impl ValidationRule for FinishDateRule {
    fn name(&self) -> &'static str { "finish_date" }

    fn validate(&self, request: &IssuanceRequest) -> Vec<ValidationViolation> {
        let raw = request.finish_date.trim();
        // Empty dates belong to RequiredFieldsRule
        if request.use_current_date || raw.is_empty() || parse_ddmmyy(raw).is_ok() {
            return vec![];
        }
        vec![ValidationViolation {
            rule: self.name().to_string(),
            field: Field::FinishDate,
            severity: ViolationSeverity::Error,
            message: format!("'{}' is not a DDMMYY date", raw),
        }]
    }
}

/// Validator orchestrates rules
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(RequiredFieldsRule),
                Box::new(FinishDateRule),
            ],
        }
    }

    pub fn validate(&self, request: &IssuanceRequest) -> ValidationResult {
        let violations: Vec<_> = self.rules
            .iter()
            .flat_map(|rule| rule.validate(request))
            .collect();

        let valid = !violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        ValidationResult { valid, violations }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
