use std::fmt;

use thiserror::Error;

/// Errors that can occur while building a record or loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordError {
    /// One or more validation rules failed. Every violation is listed.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Configuration could not be loaded or names an unsupported value.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RecordError {
    /// The individual violations, empty for non-validation errors.
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            Self::Validation(errors) => errors.as_slice(),
            Self::Config(_) => &[],
        }
    }

    /// True if any violation has the given kind.
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.errors().iter().any(|e| e.kind == kind)
    }

    /// True if any violation concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors().iter().any(|e| e.field == field)
    }
}

impl From<ValidationError> for RecordError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(ValidationErrors(vec![error]))
    }
}

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A single attribute violates its own constraint.
    InvalidField,
    /// A cross-field or regime-matrix rule is violated.
    InvalidCombination,
    /// Malformed previous-record reference or fingerprint.
    InvalidChaining,
    /// Totals reconciliation tolerance exceeded.
    InvalidTotals,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidField => "invalid field",
            Self::InvalidCombination => "invalid combination",
            Self::InvalidChaining => "invalid chaining",
            Self::InvalidTotals => "invalid totals",
        }
    }
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// What kind of rule failed.
    pub kind: ErrorKind,
    /// Dot-separated path to the invalid field (e.g. "breakdown[0].tax_rate").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind.as_str(), self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(kind: ErrorKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }

    /// A single attribute violates its own constraint.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidField, field, message)
    }

    /// A cross-field rule is violated.
    pub fn combination(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidCombination, field, message)
    }

    pub fn chaining(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidChaining, field, message)
    }

    pub fn totals(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidTotals, field, message)
    }

    /// Prefix the field path, e.g. `tax_rate` becomes `breakdown[2].tax_rate`.
    pub fn nested(mut self, prefix: &str) -> Self {
        self.field = if self.field.is_empty() {
            prefix.to_string()
        } else {
            format!("{prefix}.{}", self.field)
        };
        self
    }
}

/// Every violation found while validating one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

/// Turn a list of collected violations into a result.
pub(crate) fn into_result<T>(errors: Vec<ValidationError>, value: impl FnOnce() -> T) -> Result<T, RecordError> {
    if errors.is_empty() {
        Ok(value())
    } else {
        Err(RecordError::Validation(ValidationErrors(errors)))
    }
}

/// Wrap violations that are already known to be non-empty.
pub(crate) fn reject(errors: Vec<ValidationError>) -> RecordError {
    RecordError::Validation(ValidationErrors(errors))
}

/// Re-home the violations of a nested value under `prefix`.
pub(crate) fn nest_errors(error: RecordError, prefix: &str, errors: &mut Vec<ValidationError>) {
    match error {
        RecordError::Validation(inner) => {
            errors.extend(inner.into_inner().into_iter().map(|e| e.nested(prefix)));
        }
        RecordError::Config(message) => errors.push(ValidationError::field(prefix, message)),
    }
}
