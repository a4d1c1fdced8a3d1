//! Annotation validation against a variable set.
//!
//! `Validator::validate` is a pure function of its inputs: it never touches
//! the candidate set and returns the normalised annotation map (coerced
//! scalars, injected defaults) for the caller to keep.
//!
//! Explicit `null` values are treated as absent, so a `null` on a required
//! variable without default fails the same way an omitted key does.

use annot_config::ValidationConfig;
use annot_core::entities::{AnnotationSet, Variable, VariableSet};
use annot_core::enums::{EntityType, VariableType};
use annot_core::errors::AnnotationError;
use annot_core::value::{AnnotationMap, AnnotationValue};
use annot_schema::coerce::coerce_value;
use annot_schema::find_variable;

use crate::collision::check_unique_variable_set;

/// Whether the candidate is a brand new annotation set or the result of
/// changing a stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationMode {
    /// Every missing variable with a default receives it, and the variable
    /// set's entity restriction is enforced.
    NewSet,
    /// Only missing required variables receive their default.
    Existing,
}

impl ValidationMode {
    const fn injects_default(self, variable: &Variable) -> bool {
        match self {
            Self::NewSet => true,
            Self::Existing => variable.required,
        }
    }
}

/// Schema-aware annotation validator.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    coerce: bool,
    max_depth: u32,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&ValidationConfig::default())
    }
}

impl Validator {
    #[must_use]
    pub const fn new(config: &ValidationConfig) -> Self {
        Self {
            coerce: config.coerce_scalars,
            max_depth: config.max_depth,
        }
    }

    /// Validate `candidate` against `variable_set`.
    ///
    /// `prior` are the other annotation sets of the same entity (persisted
    /// and already admitted from the same batch); when given, a `unique`
    /// variable set may not be used twice.
    ///
    /// # Errors
    ///
    /// Returns a schema error (`VariableSetMismatch`, `EntityTypeNotAllowed`,
    /// `UnknownVariable`, `TypeMismatch`, `MissingRequiredValue`,
    /// `ValueNotAllowed`), `UniqueVariableSetViolation`, or
    /// `InternalValidation` when nesting exceeds the configured depth.
    pub fn validate(
        &self,
        variable_set: &VariableSet,
        candidate: &AnnotationSet,
        prior: Option<&[AnnotationSet]>,
        mode: ValidationMode,
        entity_type: EntityType,
    ) -> Result<AnnotationMap, AnnotationError> {
        if variable_set.id != candidate.variable_set_id {
            return Err(AnnotationError::VariableSetMismatch {
                expected: variable_set.id.clone(),
                found: candidate.variable_set_id.clone(),
            });
        }

        if mode == ValidationMode::NewSet && !variable_set.allows_entity(entity_type) {
            return Err(AnnotationError::EntityTypeNotAllowed {
                variable_set: variable_set.id.clone(),
                entity_type: entity_type.to_string(),
            });
        }

        if let Some(prior) = prior {
            check_unique_variable_set(variable_set, candidate, prior)?;
        }

        self.validate_level(
            &variable_set.variables,
            &candidate.annotations,
            mode,
            None,
            0,
        )
    }

    fn validate_level(
        &self,
        variables: &[Variable],
        annotations: &AnnotationMap,
        mode: ValidationMode,
        parent: Option<&str>,
        depth: u32,
    ) -> Result<AnnotationMap, AnnotationError> {
        // Explicit nulls, and values that coerce to null, count as absent.
        let mut out = AnnotationMap::new();
        for (key, value) in annotations {
            if value.is_null() {
                continue;
            }
            let path = join(parent, key);
            let Some(variable) = find_variable(variables, key) else {
                return Err(AnnotationError::UnknownVariable { path });
            };
            let checked = self.check_value(variable, value, mode, &path, depth)?;
            if !checked.is_null() {
                out.insert(key.clone(), checked);
            }
        }

        for variable in variables {
            if out.contains_key(&variable.id) {
                continue;
            }
            let path = join(parent, &variable.id);
            let default = variable
                .default_value
                .as_ref()
                .filter(|_| mode.injects_default(variable))
                .map(|d| self.check_value(variable, d, mode, &path, depth))
                .transpose()?
                .filter(|d| !d.is_null());
            match default {
                Some(default) => {
                    out.insert(variable.id.clone(), default);
                }
                None if variable.required => {
                    return Err(AnnotationError::MissingRequiredValue { variable: path });
                }
                None => {}
            }
        }
        Ok(out)
    }

    fn check_value(
        &self,
        variable: &Variable,
        value: &AnnotationValue,
        mode: ValidationMode,
        path: &str,
        depth: u32,
    ) -> Result<AnnotationValue, AnnotationError> {
        if variable.variable_type == VariableType::Object {
            self.validate_object(variable, value, mode, path, depth)
        } else {
            coerce_value(path, variable, value, self.coerce)
        }
    }

    fn validate_object(
        &self,
        variable: &Variable,
        value: &AnnotationValue,
        mode: ValidationMode,
        path: &str,
        depth: u32,
    ) -> Result<AnnotationValue, AnnotationError> {
        if depth + 1 > self.max_depth {
            return Err(AnnotationError::InternalValidation {
                path: path.to_string(),
                reason: format!("object nesting deeper than {} levels", self.max_depth),
            });
        }

        match value {
            AnnotationValue::Object(map) => self
                .validate_level(&variable.variables, map, mode, Some(path), depth + 1)
                .map(AnnotationValue::Object),
            AnnotationValue::List(items) if variable.multi_value => {
                if items.is_empty() {
                    if let Some(required) = variable.variables.iter().find(|v| v.required) {
                        return Err(AnnotationError::MissingRequiredValue {
                            variable: format!("{path}.{}", required.id),
                        });
                    }
                }
                items
                    .iter()
                    .map(|item| match item {
                        AnnotationValue::Object(map) => self
                            .validate_level(&variable.variables, map, mode, Some(path), depth + 1)
                            .map(AnnotationValue::Object),
                        other => Err(object_mismatch(path, other)),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(AnnotationValue::List)
            }
            AnnotationValue::List(_) => Err(AnnotationError::ValueNotAllowed {
                variable: path.to_string(),
                value: value.to_string(),
                reason: "variable does not accept multiple values".into(),
            }),
            other => Err(object_mismatch(path, other)),
        }
    }
}

fn object_mismatch(path: &str, value: &AnnotationValue) -> AnnotationError {
    AnnotationError::TypeMismatch {
        variable: path.to_string(),
        expected: VariableType::Object.to_string(),
        found: format!("{} {value}", value.kind()),
    }
}

fn join(parent: Option<&str>, id: &str) -> String {
    parent.map_or_else(|| id.to_string(), |p| format!("{p}.{id}"))
}
