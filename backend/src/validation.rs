//! Request validation for the Leadflow API
//!
//! Malformed leads are rejected here, before a workflow context exists.

use leadflow_shared::Lead;

use crate::error::{AppError, ValidationBuilder};

/// Validation result type
pub type ValidationResult<T> = Result<T, AppError>;

pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_COMPANY_LENGTH: usize = 200;
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Email validation
pub mod email {
    /// Basic shape check: one `@`, non-empty local part, dotted domain
    pub fn is_valid(value: &str) -> bool {
        let email = value.trim();
        let parts: Vec<&str> = email.split('@').collect();

        parts.len() == 2
            && !parts[0].is_empty()
            && !parts[1].is_empty()
            && parts[1].contains('.')
            && !parts[1].starts_with('.')
            && !parts[1].ends_with('.')
            && !email.contains(char::is_whitespace)
    }
}

/// Fluent validator that accumulates all field errors
pub struct Validator {
    builder: ValidationBuilder,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            builder: ValidationBuilder::new(),
        }
    }

    /// Add error for a field
    pub fn error(mut self, field: &str, message: &str) -> Self {
        self.builder = self.builder.error(field, message);
        self
    }

    /// Add error if condition is true
    pub fn error_if(self, condition: bool, field: &str, message: &str) -> Self {
        if condition {
            self.error(field, message)
        } else {
            self
        }
    }

    /// Validate required string
    pub fn required(self, value: &str, field: &str) -> Self {
        if value.trim().is_empty() {
            self.error(field, &format!("{} is required", field))
        } else {
            self
        }
    }

    /// Validate email format
    pub fn email(self, value: &str, field: &str) -> Self {
        if !value.trim().is_empty() && !email::is_valid(value) {
            self.error(field, "Invalid email format")
        } else {
            self
        }
    }

    /// Validate max length (in characters)
    pub fn max_length(self, value: &str, field: &str, max: usize) -> Self {
        if value.chars().count() > max {
            self.error(field, &format!("{} must be {} characters or less", field, max))
        } else {
            self
        }
    }

    /// Finish validation and return result
    pub fn finish(self) -> ValidationResult<()> {
        match self.builder.build() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a lead before it is allowed to drive a workflow
pub fn validate_lead(lead: &Lead) -> ValidationResult<()> {
    let budget_is_blank = lead.budget.as_deref().is_some_and(|b| b.trim().is_empty());

    Validator::new()
        .required(&lead.name, "name")
        .max_length(&lead.name, "name", MAX_NAME_LENGTH)
        .required(&lead.email, "email")
        .email(&lead.email, "email")
        .max_length(&lead.company, "company", MAX_COMPANY_LENGTH)
        .max_length(&lead.message, "message", MAX_MESSAGE_LENGTH)
        .error_if(budget_is_blank, "budget", "budget cannot be blank when provided")
        .error_if(
            lead.updated_at < lead.created_at,
            "updatedAt",
            "updatedAt cannot be earlier than createdAt",
        )
        .finish()
}
