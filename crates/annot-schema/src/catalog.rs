//! Study-scoped lookup of variable sets.

use std::collections::HashMap;

use annot_core::entities::{Study, Variable, VariableSet};
use annot_core::errors::AnnotationError;

use crate::lookup::resolve_variable;

/// Read-only index over the variable sets of one study.
///
/// Borrowing the study keeps the index cheap to build per request; it is
/// never cached across calls.
#[derive(Debug, Clone)]
pub struct VariableSetCatalog<'a> {
    study: &'a str,
    by_id: HashMap<&'a str, &'a VariableSet>,
}

impl<'a> VariableSetCatalog<'a> {
    #[must_use]
    pub fn new(study: &'a Study) -> Self {
        let by_id = study
            .variable_sets
            .iter()
            .map(|vs| (vs.id.as_str(), vs))
            .collect();
        Self {
            study: &study.fqn,
            by_id,
        }
    }

    /// Fully qualified name of the indexed study.
    #[must_use]
    pub const fn study(&self) -> &'a str {
        self.study
    }

    /// Fail when the study declares no variable sets at all.
    ///
    /// # Errors
    ///
    /// Returns `AnnotationError::NoVariableSets`.
    pub fn require_non_empty(&self) -> Result<(), AnnotationError> {
        if self.by_id.is_empty() {
            return Err(AnnotationError::NoVariableSets {
                study: self.study.to_string(),
            });
        }
        Ok(())
    }

    /// Look up a variable set by exact id.
    ///
    /// # Errors
    ///
    /// Returns `AnnotationError::VariableSetNotFound` for unknown ids.
    pub fn find_variable_set(&self, id: &str) -> Result<&'a VariableSet, AnnotationError> {
        self.get(id).ok_or_else(|| AnnotationError::VariableSetNotFound {
            id: id.to_string(),
            study: self.study.to_string(),
        })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'a VariableSet> {
        self.by_id.get(id).copied()
    }

    /// Resolve a dotted variable path inside a variable set.
    ///
    /// # Errors
    ///
    /// Returns `VariableSetNotFound` or `UnknownVariable`.
    pub fn find_variable(
        &self,
        variable_set_id: &str,
        path: &str,
    ) -> Result<&'a Variable, AnnotationError> {
        let variable_set = self.find_variable_set(variable_set_id)?;
        resolve_variable(&variable_set.variables, path).ok_or_else(|| {
            AnnotationError::UnknownVariable {
                path: path.to_string(),
            }
        })
    }

    /// Variable sets ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &'a VariableSet> + use<'a> {
        let mut sets: Vec<&'a VariableSet> = self.by_id.values().copied().collect();
        sets.sort_by(|a, b| a.id.cmp(&b.id));
        sets.into_iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
