//! Dotted-path RESET and REMOVE on an annotation map.
//!
//! Each level resolves only the first segment of the path against the
//! current schema level and hands the rest to the nested schema. A missing
//! intermediate key in the annotation map is a silent no-op; a path the
//! schema cannot resolve is an internal validation error. Lists of objects
//! (multi-value OBJECT variables) apply the operation to every element.

use annot_core::entities::Variable;
use annot_core::errors::AnnotationError;
use annot_core::value::{AnnotationMap, AnnotationValue};
use annot_schema::{find_variable, split_path};

fn unresolved(full: &str, reason: impl Into<String>) -> AnnotationError {
    AnnotationError::InternalValidation {
        path: full.to_string(),
        reason: reason.into(),
    }
}

/// Descend one level into `head`, or return `Ok(None)` if the annotation map
/// does not contain it.
fn descend<'m, 'v>(
    annotations: &'m mut AnnotationMap,
    head: &str,
    variables: &'v [Variable],
    full: &str,
) -> Result<Option<(&'m mut AnnotationValue, &'v [Variable])>, AnnotationError> {
    let Some(value) = annotations.get_mut(head) else {
        return Ok(None);
    };
    let variable = find_variable(variables, head)
        .ok_or_else(|| unresolved(full, format!("'{head}' is not declared in the variable set")))?;
    if variable.variables.is_empty() {
        return Err(unresolved(full, format!("'{head}' has no nested variables")));
    }
    Ok(Some((value, &variable.variables)))
}

fn for_each_object(
    value: &mut AnnotationValue,
    full: &str,
    mut op: impl FnMut(&mut AnnotationMap) -> Result<(), AnnotationError>,
) -> Result<(), AnnotationError> {
    match value {
        AnnotationValue::Object(map) => op(map),
        AnnotationValue::List(items) => items.iter_mut().try_for_each(|item| match item {
            AnnotationValue::Object(map) => op(map),
            other => Err(unresolved(full, format!("expected an object, found {}", other.kind()))),
        }),
        other => Err(unresolved(full, format!("expected an object, found {}", other.kind()))),
    }
}

/// Set the value at `path` to its variable's default.
pub(super) fn reset(
    annotations: &mut AnnotationMap,
    path: &str,
    variables: &[Variable],
    full: &str,
) -> Result<(), AnnotationError> {
    let (head, rest) = split_path(path);
    match rest {
        Some(rest) => {
            let Some((value, nested)) = descend(annotations, head, variables, full)? else {
                return Ok(());
            };
            for_each_object(value, full, |map| reset(map, rest, nested, full))
        }
        None => {
            let variable = find_variable(variables, head)
                .ok_or_else(|| unresolved(full, format!("'{head}' is not declared in the variable set")))?;
            let default = variable
                .default_value
                .as_ref()
                .filter(|d| !d.is_null())
                .ok_or_else(|| AnnotationError::NoDefaultValue {
                    path: full.to_string(),
                })?;
            annotations.insert(head.to_string(), default.clone());
            Ok(())
        }
    }
}

/// Delete the value at `path`. Required variables cannot be removed.
pub(super) fn remove(
    annotations: &mut AnnotationMap,
    path: &str,
    variables: &[Variable],
    full: &str,
) -> Result<(), AnnotationError> {
    let (head, rest) = split_path(path);
    match rest {
        Some(rest) => {
            let Some((value, nested)) = descend(annotations, head, variables, full)? else {
                return Ok(());
            };
            for_each_object(value, full, |map| remove(map, rest, nested, full))
        }
        None => {
            if find_variable(variables, head).is_some_and(|v| v.required) {
                return Err(AnnotationError::CannotRemoveRequired {
                    path: full.to_string(),
                });
            }
            annotations.remove(head);
            Ok(())
        }
    }
}
