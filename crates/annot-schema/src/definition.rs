//! Definition checks for variable sets.
//!
//! Variable sets arrive from the study configuration provider. Before the
//! validator relies on one, `check_variable_set` confirms it is internally
//! consistent: unique ids per level, nested variables only under OBJECT,
//! well-formed allowed values and defaults that satisfy their own variable.

use std::collections::HashSet;

use annot_core::entities::{Variable, VariableSet};
use annot_core::enums::VariableType;
use annot_core::errors::AnnotationError;

use crate::coerce::{NumericRange, coerce_value};

/// Check a variable set definition.
///
/// # Errors
///
/// Returns `AnnotationError::InvalidVariableDefinition` naming the dotted path
/// of the first offending variable.
pub fn check_variable_set(variable_set: &VariableSet) -> Result<(), AnnotationError> {
    if variable_set.id.trim().is_empty() {
        return Err(AnnotationError::MissingParameter {
            name: "variableSet.id".into(),
        });
    }
    check_variables(&variable_set.variables, None)
}

fn invalid(path: &str, reason: impl Into<String>) -> AnnotationError {
    AnnotationError::InvalidVariableDefinition {
        variable: path.to_string(),
        reason: reason.into(),
    }
}

fn check_variables(variables: &[Variable], parent: Option<&str>) -> Result<(), AnnotationError> {
    let mut seen = HashSet::with_capacity(variables.len());
    for variable in variables {
        let path = parent.map_or_else(|| variable.id.clone(), |p| format!("{p}.{}", variable.id));
        if variable.id.trim().is_empty() {
            return Err(invalid(&path, "variable id is empty"));
        }
        if !seen.insert(variable.id.as_str()) {
            return Err(invalid(&path, "duplicated variable id"));
        }
        check_variable(variable, &path)?;
    }
    Ok(())
}

fn check_variable(variable: &Variable, path: &str) -> Result<(), AnnotationError> {
    match variable.variable_type {
        VariableType::Object => {
            if !variable.allowed_values.is_empty() {
                return Err(invalid(path, "OBJECT variables cannot declare allowed values"));
            }
            check_variables(&variable.variables, Some(path))?;
        }
        other => {
            if !variable.variables.is_empty() {
                return Err(invalid(
                    path,
                    format!("only OBJECT variables can contain nested variables, found {other}"),
                ));
            }
        }
    }

    match variable.variable_type {
        VariableType::Boolean if !variable.allowed_values.is_empty() => {
            return Err(invalid(path, "BOOLEAN variables cannot declare allowed values"));
        }
        VariableType::Integer | VariableType::Double => {
            for range in &variable.allowed_values {
                NumericRange::parse(range).map_err(|reason| invalid(path, reason))?;
            }
        }
        _ => {}
    }

    if !variable.allowed_keys.is_empty() && !variable.variable_type.is_map() {
        return Err(invalid(path, "only MAP variables can declare allowed keys"));
    }

    check_default(variable, path)
}

fn check_default(variable: &Variable, path: &str) -> Result<(), AnnotationError> {
    let Some(default) = variable.default_value.as_ref().filter(|d| !d.is_null()) else {
        return Ok(());
    };
    if variable.variable_type == VariableType::Object {
        return if default.as_object().is_some() {
            Ok(())
        } else {
            Err(invalid(path, "default value of an OBJECT variable must be an object"))
        };
    }
    coerce_value(path, variable, default, true)
        .map(|_| ())
        .map_err(|err| invalid(path, format!("default value is not valid: {err}")))
}
