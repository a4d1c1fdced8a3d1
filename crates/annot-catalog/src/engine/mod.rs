//! Incremental update engine.
//!
//! `apply` takes one `UpdateAction` and produces the changed annotation set.
//! It works on a copy, so the stored set is untouched when any step fails.
//! The caller re-validates the result with `ValidationMode::Existing` before
//! accepting it.
//!
//! | Action  | Payload                          | Effect                                   |
//! |---------|----------------------------------|------------------------------------------|
//! | ADD     | non-empty map                    | merge, overwriting top-level keys        |
//! | SET     | any map                          | replace the whole map                    |
//! | REPLACE | non-empty map                    | overwrite only keys already present      |
//! | RESET   | `{"reset": "a,b.c"}`             | set each path to its default             |
//! | REMOVE  | `{"remove": "a,b.c"}`            | delete each non-required path            |

mod path;

use tracing::debug;

use annot_core::entities::{AnnotationSet, VariableSet};
use annot_core::enums::UpdateAction;
use annot_core::errors::AnnotationError;
use annot_core::value::{AnnotationMap, AnnotationValue};

/// Apply `action` with `payload` to a copy of `target`.
///
/// # Errors
///
/// Returns `EmptyPayload` for an empty ADD/REPLACE payload, `MalformedPayload`
/// for RESET/REMOVE payloads that are not a single path-list key,
/// `NoDefaultValue`, `CannotRemoveRequired`, or `InternalValidation` when a
/// path cannot be resolved in `variable_set`.
pub fn apply(
    action: UpdateAction,
    target: &AnnotationSet,
    payload: &AnnotationMap,
    variable_set: &VariableSet,
) -> Result<AnnotationSet, AnnotationError> {
    let mut updated = target.clone();

    match action {
        UpdateAction::Add => {
            require_non_empty(action, payload)?;
            updated
                .annotations
                .extend(payload.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        UpdateAction::Set => {
            updated.annotations = payload.clone();
        }
        UpdateAction::Replace => {
            require_non_empty(action, payload)?;
            replace(&mut updated.annotations, payload);
        }
        UpdateAction::Reset => {
            for variable in path_list(action, payload)? {
                path::reset(&mut updated.annotations, variable, &variable_set.variables, variable)?;
            }
        }
        UpdateAction::Remove => {
            for variable in path_list(action, payload)? {
                path::remove(&mut updated.annotations, variable, &variable_set.variables, variable)?;
            }
        }
    }

    debug!(
        annotation_set = %target.id,
        action = %action,
        keys = updated.annotations.len(),
        "applied annotation change"
    );
    Ok(updated)
}

fn require_non_empty(action: UpdateAction, payload: &AnnotationMap) -> Result<(), AnnotationError> {
    if payload.is_empty() {
        return Err(AnnotationError::EmptyPayload {
            action: action.to_string(),
        });
    }
    Ok(())
}

/// Overwrite keys of `target` that are also in `source`. Maps recurse when
/// both sides hold a map; a map in `source` over a scalar in `target` is
/// ignored.
fn replace(target: &mut AnnotationMap, source: &AnnotationMap) {
    for (key, new_value) in source {
        let Some(current) = target.get_mut(key) else {
            continue;
        };
        match (current, new_value) {
            (AnnotationValue::Object(current), AnnotationValue::Object(new_map)) => {
                replace(current, new_map);
            }
            (_, AnnotationValue::Object(_)) => {}
            (current, new_value) => *current = new_value.clone(),
        }
    }
}

/// Extract the comma-separated path list of a RESET/REMOVE payload.
fn path_list(action: UpdateAction, payload: &AnnotationMap) -> Result<Vec<&str>, AnnotationError> {
    let Some(key) = action.path_list_key() else {
        return Err(AnnotationError::InternalValidation {
            path: action.to_string(),
            reason: "action does not take a path list".into(),
        });
    };
    let malformed = || AnnotationError::MalformedPayload {
        action: action.to_string(),
        expected_key: key.to_string(),
    };

    if payload.len() != 1 {
        return Err(malformed());
    }
    let list = payload
        .get(key)
        .and_then(AnnotationValue::as_str)
        .ok_or_else(malformed)?;
    let paths: Vec<&str> = list
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if paths.is_empty() {
        return Err(malformed());
    }
    Ok(paths)
}
