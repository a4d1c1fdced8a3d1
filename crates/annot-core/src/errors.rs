//! Error taxonomy for the annotation subsystem.
//!
//! Every failure of validation, collision checking, incremental updates or
//! orchestration is an `AnnotationError`. `ErrorCategory` groups the variants
//! the way callers report them; `annot-config` keeps its own `ConfigError`.

use std::fmt;

use thiserror::Error;

/// Coarse classification of an `AnnotationError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Annotations do not conform to their variable set.
    Schema,
    /// Identity clashes or missing annotation sets.
    Conflict,
    /// Malformed update requests.
    UpdateSemantics,
    /// Schema path resolution failed where upstream checks should have
    /// prevented it. Signals a bug, not bad input.
    InternalValidation,
    /// The authorization collaborator denied access.
    Permission,
    /// A raw payload could not be decoded into typed annotation data.
    Decode,
    /// An external collaborator (persistence) failed.
    Collaborator,
}

impl ErrorCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Conflict => "conflict",
            Self::UpdateSemantics => "update_semantics",
            Self::InternalValidation => "internal_validation",
            Self::Permission => "permission",
            Self::Decode => "decode",
            Self::Collaborator => "collaborator",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the annotation subsystem.
#[derive(Debug, Error)]
pub enum AnnotationError {
    // --- Schema ---
    #[error("Annotation id '{path}' is not an accepted id")]
    UnknownVariable { path: String },

    #[error("Value for '{variable}' does not match type {expected}: found {found}")]
    TypeMismatch {
        variable: String,
        expected: String,
        found: String,
    },

    #[error("Missing required variable {variable}")]
    MissingRequiredValue { variable: String },

    #[error("Value '{value}' is not allowed for variable {variable}: {reason}")]
    ValueNotAllowed {
        variable: String,
        value: String,
        reason: String,
    },

    #[error("VariableSet {variable_set} cannot annotate entities of type {entity_type}")]
    EntityTypeNotAllowed {
        variable_set: String,
        entity_type: String,
    },

    #[error("VariableSet {expected} does not match the AnnotationSet variableSetId {found}")]
    VariableSetMismatch { expected: String, found: String },

    #[error("VariableSet {id} not found in study {study}")]
    VariableSetNotFound { id: String, study: String },

    #[error("Study {study} has no VariableSets; nothing can be annotated")]
    NoVariableSets { study: String },

    #[error("Invalid variable definition '{variable}': {reason}")]
    InvalidVariableDefinition { variable: String, reason: String },

    // --- Conflict ---
    #[error("An AnnotationSet with id {id} already exists")]
    DuplicateAnnotationSetId { id: String },

    #[error("VariableSet {variable_set} is unique and is already used by another AnnotationSet")]
    UniqueVariableSetViolation { variable_set: String },

    #[error("AnnotationSet {id} not found. Annotations could not be updated")]
    AnnotationSetNotFound { id: String },

    #[error("Expected exactly one AnnotationSet, found {count}")]
    MultipleAnnotationSets { count: usize },

    // --- Update semantics ---
    #[error("Missing mandatory parameter '{name}'")]
    MissingParameter { name: String },

    #[error("Invalid {name} '{value}': only alphanumerics and _ - . + are allowed")]
    InvalidId { name: String, value: String },

    #[error("Unrecognised {field} action '{action}'")]
    UnknownAction { field: String, action: String },

    #[error("Missing annotations for {action} action")]
    EmptyPayload { action: String },

    #[error("Malformed {action} payload: expected a single '{expected_key}' key with a comma-separated list of variables")]
    MalformedPayload {
        action: String,
        expected_key: String,
    },

    #[error("{path}: no default value found for variable")]
    NoDefaultValue { path: String },

    #[error("{path}: cannot remove required variable")]
    CannotRemoveRequired { path: String },

    #[error("Annotation query '{clause}' not accepted: {reason}")]
    InvalidQuery { clause: String, reason: String },

    // --- Internal ---
    #[error("Internal validation error at '{path}': {reason}")]
    InternalValidation { path: String, reason: String },

    // --- Permission ---
    #[error("User {user} lacks permission {permission} in study {study}")]
    PermissionDenied {
        study: String,
        user: String,
        permission: String,
    },

    // --- Decode ---
    #[error("Could not decode {context}: {message}")]
    Decode { context: String, message: String },

    // --- Collaborators ---
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

impl AnnotationError {
    /// Category used when reporting the error to the end user.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownVariable { .. }
            | Self::TypeMismatch { .. }
            | Self::MissingRequiredValue { .. }
            | Self::ValueNotAllowed { .. }
            | Self::EntityTypeNotAllowed { .. }
            | Self::VariableSetMismatch { .. }
            | Self::VariableSetNotFound { .. }
            | Self::NoVariableSets { .. }
            | Self::InvalidVariableDefinition { .. } => ErrorCategory::Schema,
            Self::DuplicateAnnotationSetId { .. }
            | Self::UniqueVariableSetViolation { .. }
            | Self::AnnotationSetNotFound { .. }
            | Self::MultipleAnnotationSets { .. } => ErrorCategory::Conflict,
            Self::MissingParameter { .. }
            | Self::InvalidId { .. }
            | Self::UnknownAction { .. }
            | Self::EmptyPayload { .. }
            | Self::MalformedPayload { .. }
            | Self::NoDefaultValue { .. }
            | Self::CannotRemoveRequired { .. }
            | Self::InvalidQuery { .. } => ErrorCategory::UpdateSemantics,
            Self::InternalValidation { .. } => ErrorCategory::InternalValidation,
            Self::PermissionDenied { .. } => ErrorCategory::Permission,
            Self::Decode { .. } => ErrorCategory::Decode,
            Self::Collaborator(_) => ErrorCategory::Collaborator,
        }
    }

    /// Wrap a serde failure, keeping its message.
    pub fn decode(context: impl Into<String>, err: &serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            message: err.to_string(),
        }
    }
}
