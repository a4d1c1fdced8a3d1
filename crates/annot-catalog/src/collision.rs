//! Annotation set collision checks.
//!
//! Ids are unique per entity, and a `unique` variable set backs at most one
//! annotation set per entity. `BatchGuard` applies both rules incrementally
//! so that, within one request, every candidate is checked against the
//! persisted sets and the candidates admitted before it. The first occurrence
//! of an id wins; later duplicates are rejected.

use annot_core::entities::{AnnotationSet, VariableSet};
use annot_core::errors::AnnotationError;

/// Fail if `candidate.id` is already used by one of `existing`.
///
/// # Errors
///
/// Returns `AnnotationError::DuplicateAnnotationSetId`.
pub fn check_no_collision(
    candidate: &AnnotationSet,
    existing: &[AnnotationSet],
) -> Result<(), AnnotationError> {
    if existing.iter().any(|set| set.id == candidate.id) {
        return Err(AnnotationError::DuplicateAnnotationSetId {
            id: candidate.id.clone(),
        });
    }
    Ok(())
}

/// Fail if `variable_set` is unique and one of `existing` already uses it.
///
/// # Errors
///
/// Returns `AnnotationError::UniqueVariableSetViolation`.
pub fn check_unique_variable_set(
    variable_set: &VariableSet,
    candidate: &AnnotationSet,
    existing: &[AnnotationSet],
) -> Result<(), AnnotationError> {
    if variable_set.unique
        && existing
            .iter()
            .any(|set| set.variable_set_id == candidate.variable_set_id)
    {
        return Err(AnnotationError::UniqueVariableSetViolation {
            variable_set: variable_set.id.clone(),
        });
    }
    Ok(())
}

/// Incremental collision state for one batch of new annotation sets.
#[derive(Debug, Default)]
pub struct BatchGuard {
    known: Vec<AnnotationSet>,
    persisted: usize,
}

impl BatchGuard {
    /// Start a batch on top of the entity's persisted annotation sets.
    #[must_use]
    pub fn new(persisted: Vec<AnnotationSet>) -> Self {
        let persisted_len = persisted.len();
        Self {
            known: persisted,
            persisted: persisted_len,
        }
    }

    /// Persisted sets followed by the candidates admitted so far, in order.
    #[must_use]
    pub fn known(&self) -> &[AnnotationSet] {
        &self.known
    }

    /// Check a candidate's id without admitting it.
    ///
    /// # Errors
    ///
    /// Returns `AnnotationError::DuplicateAnnotationSetId`.
    pub fn check(&self, candidate: &AnnotationSet) -> Result<(), AnnotationError> {
        check_no_collision(candidate, &self.known)
    }

    /// Check and admit a candidate.
    ///
    /// # Errors
    ///
    /// Returns `AnnotationError::DuplicateAnnotationSetId`; the guard is left
    /// unchanged.
    pub fn admit(&mut self, candidate: AnnotationSet) -> Result<(), AnnotationError> {
        self.check(&candidate)?;
        self.known.push(candidate);
        Ok(())
    }

    /// Candidates admitted in this batch, in input order.
    #[must_use]
    pub fn admitted(&self) -> &[AnnotationSet] {
        &self.known[self.persisted..]
    }

    #[must_use]
    pub fn into_admitted(mut self) -> Vec<AnnotationSet> {
        self.known.split_off(self.persisted)
    }
}
