//! Declarative field rules: required, minimum and maximum length.

use crate::error::AppError;

/// Length limits for one text field. Lengths count characters, not bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextRule {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl TextRule {
    pub const fn new() -> Self {
        TextRule {
            min_length: None,
            max_length: None,
        }
    }

    pub const fn min(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub const fn max(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }
}

/// Required fields must be present, non-null and not blank.
pub fn require_text(field: &str, value: Option<String>) -> Result<String, AppError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(AppError::Validation(format!("{} is required", field))),
    }
}

pub fn validate_text(field: &str, value: &str, rule: TextRule) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    let len = value.chars().count();
    if let Some(min) = rule.min_length {
        if len < min {
            return Err(AppError::Validation(format!(
                "{} must be at least {} characters",
                field, min
            )));
        }
    }
    if let Some(max) = rule.max_length {
        if len > max {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
    }
    Ok(())
}
