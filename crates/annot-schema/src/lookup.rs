//! Variable lookup by id and by dotted path.
//!
//! Paths use `.` to descend into OBJECT variables. Splitting always happens on
//! the first `.` only, so each level resolves exactly one segment and hands
//! the remainder to the nested schema.

use annot_core::entities::Variable;

/// Split a dotted path into its first segment and the remainder.
///
/// ```
/// use annot_schema::split_path;
///
/// assert_eq!(split_path("address.geo.lat"), ("address", Some("geo.lat")));
/// assert_eq!(split_path("age"), ("age", None));
/// ```
#[must_use]
pub fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) if !rest.is_empty() => (head, Some(rest)),
        Some((head, _)) => (head, None),
        None => (path, None),
    }
}

/// Find a variable by exact, case-sensitive id among `variables`.
#[must_use]
pub fn find_variable<'a>(variables: &'a [Variable], id: &str) -> Option<&'a Variable> {
    variables.iter().find(|v| v.id == id)
}

/// Resolve a dotted path (`a.b.c`) through nested OBJECT variables.
#[must_use]
pub fn resolve_variable<'a>(variables: &'a [Variable], path: &str) -> Option<&'a Variable> {
    let (head, rest) = split_path(path);
    let variable = find_variable(variables, head)?;
    match rest {
        None => Some(variable),
        Some(rest) => resolve_variable(&variable.variables, rest),
    }
}

/// Whether `path` names a variable declared in `variables`.
#[must_use]
pub fn contains_variable_path(variables: &[Variable], path: &str) -> bool {
    resolve_variable(variables, path).is_some()
}
