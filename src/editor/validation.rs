use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// The field must not be blank.
    Required,
    /// The field is filled in but not acceptable.
    Invalid(String),
}

/// One failing field of a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub kind: FieldErrorKind,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FieldErrorKind::Required => write!(f, "{} is required", self.field),
            FieldErrorKind::Invalid(reason) => write!(f, "{} {}", self.field, reason),
        }
    }
}

/// Per-field validation results for a draft. At most one error per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed: ")?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a `Required` error when `value` is blank.
    pub fn require(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, FieldErrorKind::Required);
        }
        self
    }

    /// Record an `Invalid` error for `field`.
    pub fn reject(&mut self, field: &'static str, reason: impl Into<String>) -> &mut Self {
        self.push(field, FieldErrorKind::Invalid(reason.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether `field` already failed (later checks on it are skipped).
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn push(&mut self, field: &'static str, kind: FieldErrorKind) {
        if !self.has(field) {
            self.errors.push(FieldError { field, kind });
        }
    }
}
