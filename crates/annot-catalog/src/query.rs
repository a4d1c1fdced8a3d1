//! Annotation query normalisation.
//!
//! Searches filter entities with `;`-separated annotation clauses:
//!
//! ```text
//! [variableSet:]variable<op>value     age>30, clinical:address.city=Madrid
//! variableSet<op>id                   variableSet=clinical
//! annotationSet<op>id                 annotationSet=baseline
//! ```
//!
//! Normalisation resolves the variable set of every unqualified variable,
//! rejects unknown variable sets and variables, and records the query type
//! of each queried field so the persistence layer can cast values.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use annot_core::entities::{Study, VariableSet};
use annot_core::errors::AnnotationError;
use annot_schema::{QueryFieldType, VariableSetCatalog, variable_type_map};

use crate::gate::ConfidentialGate;

/// Prefix of clauses filtering by annotation set id.
pub const ANNOTATION_SET_CLAUSE: &str = "annotationSet";
/// Prefix of clauses filtering by variable set id.
pub const VARIABLE_SET_CLAUSE: &str = "variableSet";

static ANNOTATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^:=^<>~!$]+:)?([^=^<>~!:$]+)([=^<>~!$]+.+)$")
        .unwrap_or_else(|e| unreachable!("annotation pattern: {e}"))
});

static OPERATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(<=?|>=?|!==?|!?=?~|==?=?)([^=<>~!]+.*)$")
        .unwrap_or_else(|e| unreachable!("operation pattern: {e}"))
});

/// Canonical annotation clauses plus the query type of each queried field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedQuery {
    /// Clauses in input order. Variable clauses are always qualified as
    /// `variableSet:variable<op>value`.
    pub clauses: Vec<String>,
    /// `variableSet:variable -> type` for every variable clause.
    pub field_types: BTreeMap<String, QueryFieldType>,
}

impl NormalizedQuery {
    /// Clauses joined back with `;`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.clauses.join(";")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

fn invalid(clause: &str, reason: impl Into<String>) -> AnnotationError {
    AnnotationError::InvalidQuery {
        clause: clause.to_string(),
        reason: reason.into(),
    }
}

/// Type of `key` in one flattened variable set, including dynamic map keys
/// (`labs.hb` matches `labs.*`).
fn field_type(types: &BTreeMap<String, QueryFieldType>, key: &str) -> Option<QueryFieldType> {
    types.get(key).copied().or_else(|| {
        let (prefix, _) = key.rsplit_once('.')?;
        types.get(&format!("{prefix}.*")).copied()
    })
}

/// Normalise an annotation query against the variable sets of `study`.
///
/// When `gate` is given, querying a confidential variable set requires the
/// confidential access permission, checked once.
///
/// # Errors
///
/// Returns `InvalidQuery` for malformed clauses, unknown variables, or
/// variables found in more than one variable set; `VariableSetNotFound` for
/// unknown variable sets; and the gate's permission error.
pub fn normalize_annotation_query(
    study: &Study,
    query: &str,
    mut gate: Option<&mut ConfidentialGate<'_>>,
) -> Result<NormalizedQuery, AnnotationError> {
    let mut out = NormalizedQuery::default();
    let raw_clauses: Vec<&str> = query
        .split(';')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    if raw_clauses.is_empty() {
        return Ok(out);
    }

    let catalog = VariableSetCatalog::new(study);
    let types: BTreeMap<&str, BTreeMap<String, QueryFieldType>> = catalog
        .iter()
        .map(|vs| (vs.id.as_str(), variable_type_map(vs)))
        .collect();

    let mut admit = |vs: &VariableSet| -> Result<(), AnnotationError> {
        match gate.as_deref_mut() {
            Some(gate) => gate.admit(vs),
            None => Ok(()),
        }
    };

    for clause in raw_clauses {
        if clause.starts_with(ANNOTATION_SET_CLAUSE) {
            out.clauses.push(clause.to_string());
            continue;
        }

        let captures = ANNOTATION_PATTERN.captures(clause).ok_or_else(|| {
            invalid(clause, "supported format is [variableSet:]variable<op>value")
        })?;
        let qualifier = captures.get(1).map(|m| m.as_str().trim_end_matches(':'));
        let key = captures.get(2).map_or("", |m| m.as_str());
        let value = captures.get(3).map_or("", |m| m.as_str());

        if clause.starts_with(VARIABLE_SET_CLAUSE) {
            let operation = OPERATION_PATTERN
                .captures(value)
                .ok_or_else(|| invalid(clause, "unsupported operator"))?;
            let operator = operation.get(1).map_or("", |m| m.as_str());
            let id = operation.get(2).map_or("", |m| m.as_str());
            let variable_set = catalog.find_variable_set(id)?;
            admit(variable_set)?;
            out.clauses
                .push(format!("{VARIABLE_SET_CLAUSE}{operator}{}", variable_set.id));
            continue;
        }

        let (variable_set_id, field) = match qualifier {
            Some(vs_id) => {
                let variable_set = catalog.find_variable_set(vs_id)?;
                let field = types
                    .get(variable_set.id.as_str())
                    .and_then(|t| field_type(t, key))
                    .ok_or_else(|| {
                        invalid(
                            clause,
                            format!("variable {key} does not exist in variable set {vs_id}"),
                        )
                    })?;
                (variable_set.id.as_str(), field)
            }
            None => {
                let mut found = types
                    .iter()
                    .filter_map(|(vs_id, t)| field_type(t, key).map(|f| (*vs_id, f)));
                let first = found.next().ok_or_else(|| {
                    invalid(clause, format!("no variable set declares variable {key}"))
                })?;
                if found.next().is_some() {
                    return Err(invalid(
                        clause,
                        format!("more than one variable set declares variable {key}"),
                    ));
                }
                first
            }
        };

        admit(catalog.find_variable_set(variable_set_id)?)?;
        out.clauses.push(format!("{variable_set_id}:{key}{value}"));
        out.field_types.insert(format!("{variable_set_id}:{key}"), field);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingPermissionChecker;
    use annot_core::entities::Variable;
    use annot_core::enums::VariableType;
    use annot_core::identity::UserIdentity;
    use pretty_assertions::assert_eq;

    fn study() -> Study {
        Study::new(
            "org@proj:study",
            vec![
                VariableSet::new(
                    "clinical",
                    vec![
                        Variable::new("age", VariableType::Integer),
                        Variable::new("labs", VariableType::MapDouble),
                        Variable::new("address", VariableType::Object)
                            .with_variables(vec![Variable::new("city", VariableType::String)]),
                        Variable::new("name", VariableType::String),
                    ],
                ),
                VariableSet::new(
                    "secret",
                    vec![
                        Variable::new("diagnosis", VariableType::String),
                        Variable::new("name", VariableType::String),
                    ],
                )
                .confidential(),
            ],
        )
    }

    #[test]
    fn qualifies_unqualified_variables() {
        let q = normalize_annotation_query(&study(), "age>30;address.city=Madrid", None).unwrap();
        assert_eq!(
            q.clauses,
            vec!["clinical:age>30", "clinical:address.city=Madrid"]
        );
        assert_eq!(q.field_types["clinical:age"], QueryFieldType::Integer);
        assert_eq!(q.field_types["clinical:address.city"], QueryFieldType::Text);
        assert_eq!(q.to_query_string(), "clinical:age>30;clinical:address.city=Madrid");
    }

    #[test]
    fn resolves_dynamic_map_keys() {
        let q = normalize_annotation_query(&study(), "labs.hb<=12.5;clinical:labs.ldl>1", None).unwrap();
        assert_eq!(q.clauses, vec!["clinical:labs.hb<=12.5", "clinical:labs.ldl>1"]);
        assert_eq!(q.field_types["clinical:labs.hb"], QueryFieldType::Decimal);
    }

    #[test]
    fn ambiguous_variable_is_rejected() {
        let err = normalize_annotation_query(&study(), "name=x", None).unwrap_err();
        assert!(matches!(err, AnnotationError::InvalidQuery { .. }));
        normalize_annotation_query(&study(), "clinical:name=x", None).unwrap();
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(matches!(
            normalize_annotation_query(&study(), "weight=3", None),
            Err(AnnotationError::InvalidQuery { .. })
        ));
        assert!(matches!(
            normalize_annotation_query(&study(), "nope:age=3", None),
            Err(AnnotationError::VariableSetNotFound { .. })
        ));
        assert!(matches!(
            normalize_annotation_query(&study(), "clinical:diagnosis=x", None),
            Err(AnnotationError::InvalidQuery { .. })
        ));
        assert!(matches!(
            normalize_annotation_query(&study(), "age", None),
            Err(AnnotationError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn set_clauses_are_canonical() {
        let q = normalize_annotation_query(
            &study(),
            "annotationSet=baseline; variableSet!=clinical",
            None,
        )
        .unwrap();
        assert_eq!(q.clauses, vec!["annotationSet=baseline", "variableSet!=clinical"]);
        assert!(q.field_types.is_empty());
    }

    #[test]
    fn confidential_sets_are_checked_once() {
        let checker = RecordingPermissionChecker::allowing();
        let user = UserIdentity::new("user1");
        let mut gate = ConfidentialGate::new(&checker, "org@proj:study", &user);
        normalize_annotation_query(
            &study(),
            "diagnosis=flu;secret:name=x;variableSet=secret;age>1",
            Some(&mut gate),
        )
        .unwrap();
        assert_eq!(checker.calls(), 1);
    }

    #[test]
    fn empty_query_is_empty() {
        let q = normalize_annotation_query(&study(), " ; ", None).unwrap();
        assert!(q.is_empty());
    }
}
