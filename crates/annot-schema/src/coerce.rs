//! Scalar coercion and allowed-value enforcement.
//!
//! `coerce_value` checks a value of any non-OBJECT variable against its
//! declared type and returns the normalised value. With coercion enabled,
//! string and number spellings of scalars are accepted (`"30"` for INTEGER,
//! `"true"` or `1` for BOOLEAN, `30` for STRING) and empty strings count as
//! absent. OBJECT values are handled by the validator, which recurses into
//! the nested schema.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use annot_core::entities::Variable;
use annot_core::enums::VariableType;
use annot_core::errors::AnnotationError;
use annot_core::value::{AnnotationMap, AnnotationValue};

/// Inclusive numeric range parsed from an `allowedValues` entry `min:max`.
/// An empty side is unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericRange {
    /// Parse `min:max`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the entry is not `<min>:<max>`,
    /// either side is not numeric, or `min > max`.
    pub fn parse(range: &str) -> Result<Self, String> {
        let Some((min, max)) = range.split_once(':') else {
            return Err(format!("invalid numerical range '{range}', expected <min>:<max>"));
        };
        let parse_side = |side: &str| -> Result<Option<f64>, String> {
            let side = side.trim();
            if side.is_empty() {
                return Ok(None);
            }
            side.parse::<f64>()
                .map(Some)
                .map_err(|_| format!("invalid numerical range '{range}', '{side}' is not a number"))
        };
        let parsed = Self {
            min: parse_side(min)?,
            max: parse_side(max)?,
        };
        if let (Some(lo), Some(hi)) = (parsed.min, parsed.max) {
            if lo > hi {
                return Err(format!("invalid numerical range '{range}', min > max"));
            }
        }
        Ok(parsed)
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|lo| value >= lo) && self.max.is_none_or(|hi| value <= hi)
    }
}

/// Parse the date spellings the catalog accepts: RFC 3339, `YYYY-MM-DD`,
/// `YYYYMMDD` and `YYYYMMDDhhmmss`.
#[must_use]
pub fn is_valid_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || NaiveDate::parse_from_str(s, "%Y%m%d").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S").is_ok()
}

fn mismatch(path: &str, expected: VariableType, value: &AnnotationValue) -> AnnotationError {
    AnnotationError::TypeMismatch {
        variable: path.to_string(),
        expected: expected.to_string(),
        found: format!("{} {value}", value.kind()),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral(d: f64) -> Option<i64> {
    (d.is_finite() && d.fract() == 0.0 && d >= i64::MIN as f64 && d <= i64::MAX as f64)
        .then_some(d as i64)
}

/// Coerce one scalar to `expected`.
///
/// # Errors
///
/// Returns `AnnotationError::TypeMismatch` when the value has the wrong shape.
#[allow(clippy::cast_precision_loss)]
pub fn coerce_scalar(
    path: &str,
    expected: VariableType,
    value: &AnnotationValue,
    coerce: bool,
) -> Result<AnnotationValue, AnnotationError> {
    if value.is_null() {
        return Ok(AnnotationValue::Null);
    }
    if coerce && value.as_str().is_some_and(str::is_empty) {
        return Ok(AnnotationValue::Null);
    }

    let coerced = match (expected, value) {
        (VariableType::Boolean, AnnotationValue::Bool(b)) => Some(AnnotationValue::Bool(*b)),
        (VariableType::Boolean, AnnotationValue::String(s)) if coerce => {
            if s.eq_ignore_ascii_case("true") {
                Some(AnnotationValue::Bool(true))
            } else if s.eq_ignore_ascii_case("false") {
                Some(AnnotationValue::Bool(false))
            } else {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .map(|n| AnnotationValue::Bool(n != 0.0))
            }
        }
        (VariableType::Boolean, AnnotationValue::Int(i)) if coerce => {
            Some(AnnotationValue::Bool(*i != 0))
        }
        (VariableType::Boolean, AnnotationValue::Double(d)) if coerce => {
            Some(AnnotationValue::Bool(*d != 0.0))
        }

        (VariableType::Integer, AnnotationValue::Int(i)) => Some(AnnotationValue::Int(*i)),
        (VariableType::Integer, AnnotationValue::Double(d)) => {
            integral(*d).map(AnnotationValue::Int)
        }
        (VariableType::Integer, AnnotationValue::String(s)) if coerce => {
            s.trim().parse::<i64>().ok().map(AnnotationValue::Int)
        }

        (VariableType::Double, AnnotationValue::Int(i)) => Some(AnnotationValue::Double(*i as f64)),
        (VariableType::Double, AnnotationValue::Double(d)) => Some(AnnotationValue::Double(*d)),
        (VariableType::Double, AnnotationValue::String(s)) if coerce => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .map(AnnotationValue::Double),

        (VariableType::String | VariableType::Categorical, AnnotationValue::String(s)) => {
            Some(AnnotationValue::String(s.clone()))
        }
        (
            VariableType::String | VariableType::Categorical,
            AnnotationValue::Int(_) | AnnotationValue::Double(_) | AnnotationValue::Bool(_),
        ) if coerce => Some(AnnotationValue::String(value.to_string())),

        (VariableType::Date, AnnotationValue::String(s)) => {
            is_valid_date(s).then(|| AnnotationValue::String(s.clone()))
        }
        (VariableType::Date, AnnotationValue::Int(i)) if coerce => {
            let s = i.to_string();
            is_valid_date(&s).then_some(AnnotationValue::String(s))
        }

        _ => None,
    };

    coerced.ok_or_else(|| mismatch(path, expected, value))
}

/// Check a normalised scalar against the variable's `allowedValues`.
///
/// # Errors
///
/// Returns `AnnotationError::ValueNotAllowed` for categorical values outside
/// the allowed list or numbers outside every declared range, and
/// `AnnotationError::InvalidVariableDefinition` for unparseable ranges.
#[allow(clippy::cast_precision_loss)]
pub fn check_allowed_value(
    path: &str,
    variable: &Variable,
    value: &AnnotationValue,
) -> Result<(), AnnotationError> {
    if variable.allowed_values.is_empty() || value.is_null() {
        return Ok(());
    }
    match variable.variable_type {
        VariableType::Categorical => {
            let s = value.to_string();
            if variable.allowed_values.iter().any(|allowed| *allowed == s) {
                Ok(())
            } else {
                Err(AnnotationError::ValueNotAllowed {
                    variable: path.to_string(),
                    value: s,
                    reason: format!("allowed values are {:?}", variable.allowed_values),
                })
            }
        }
        VariableType::Integer | VariableType::Double => {
            let number = match value {
                AnnotationValue::Int(i) => *i as f64,
                AnnotationValue::Double(d) => *d,
                other => {
                    return Err(mismatch(path, variable.variable_type, other));
                }
            };
            for range in &variable.allowed_values {
                let parsed = NumericRange::parse(range).map_err(|reason| {
                    AnnotationError::InvalidVariableDefinition {
                        variable: path.to_string(),
                        reason,
                    }
                })?;
                if parsed.contains(number) {
                    return Ok(());
                }
            }
            Err(AnnotationError::ValueNotAllowed {
                variable: path.to_string(),
                value: value.to_string(),
                reason: format!("not inside any range of {:?}", variable.allowed_values),
            })
        }
        _ => Ok(()),
    }
}

fn coerce_map(
    path: &str,
    variable: &Variable,
    entry_type: VariableType,
    value: &AnnotationValue,
    coerce: bool,
) -> Result<AnnotationValue, AnnotationError> {
    let Some(map) = value.as_object() else {
        return Err(mismatch(path, variable.variable_type, value));
    };
    let mut out = AnnotationMap::new();
    for (key, entry) in map {
        if !variable.allowed_keys.is_empty() && !variable.allowed_keys.contains(key) {
            return Err(AnnotationError::ValueNotAllowed {
                variable: path.to_string(),
                value: key.clone(),
                reason: format!("allowed keys are {:?}", variable.allowed_keys),
            });
        }
        let entry_path = format!("{path}.{key}");
        out.insert(
            key.clone(),
            coerce_scalar(&entry_path, entry_type, entry, coerce)?,
        );
    }
    Ok(AnnotationValue::Object(out))
}

fn coerce_single(
    path: &str,
    variable: &Variable,
    value: &AnnotationValue,
    coerce: bool,
) -> Result<AnnotationValue, AnnotationError> {
    if let Some(entry_type) = variable.variable_type.map_value_type() {
        return coerce_map(path, variable, entry_type, value, coerce);
    }
    if variable.variable_type == VariableType::Object {
        return Err(AnnotationError::InternalValidation {
            path: path.to_string(),
            reason: "OBJECT values must be validated against their nested schema".into(),
        });
    }
    let normalised = coerce_scalar(path, variable.variable_type, value, coerce)?;
    check_allowed_value(path, variable, &normalised)?;
    Ok(normalised)
}

/// Check and normalise a value of a non-OBJECT variable, including lists for
/// multi-value variables.
///
/// # Errors
///
/// Returns `TypeMismatch`, `ValueNotAllowed` (including a list supplied for a
/// single-valued variable), or `InternalValidation` if called for an OBJECT
/// variable.
pub fn coerce_value(
    path: &str,
    variable: &Variable,
    value: &AnnotationValue,
    coerce: bool,
) -> Result<AnnotationValue, AnnotationError> {
    match value {
        AnnotationValue::Null => Ok(AnnotationValue::Null),
        AnnotationValue::List(items) => {
            if !variable.multi_value {
                return Err(AnnotationError::ValueNotAllowed {
                    variable: path.to_string(),
                    value: value.to_string(),
                    reason: "variable does not accept multiple values".into(),
                });
            }
            items
                .iter()
                .map(|item| coerce_single(path, variable, item, coerce))
                .collect::<Result<Vec<_>, _>>()
                .map(AnnotationValue::List)
        }
        single => coerce_single(path, variable, single, coerce),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(VariableType::Integer, AnnotationValue::Int(30), AnnotationValue::Int(30))]
    #[case(VariableType::Integer, AnnotationValue::from("30"), AnnotationValue::Int(30))]
    #[case(VariableType::Integer, AnnotationValue::Double(4.0), AnnotationValue::Int(4))]
    #[case(VariableType::Double, AnnotationValue::Int(2), AnnotationValue::Double(2.0))]
    #[case(VariableType::Double, AnnotationValue::from("2.5"), AnnotationValue::Double(2.5))]
    #[case(VariableType::Boolean, AnnotationValue::from("TRUE"), AnnotationValue::Bool(true))]
    #[case(VariableType::Boolean, AnnotationValue::Int(0), AnnotationValue::Bool(false))]
    #[case(VariableType::String, AnnotationValue::Int(7), AnnotationValue::from("7"))]
    #[case(VariableType::Date, AnnotationValue::from("2024-03-01"), AnnotationValue::from("2024-03-01"))]
    #[case(VariableType::Date, AnnotationValue::Int(20_240_301), AnnotationValue::from("20240301"))]
    #[case(VariableType::String, AnnotationValue::from(""), AnnotationValue::Null)]
    fn coerces_scalars(
        #[case] expected: VariableType,
        #[case] input: AnnotationValue,
        #[case] output: AnnotationValue,
    ) {
        assert_eq!(coerce_scalar("v", expected, &input, true).unwrap(), output);
    }

    #[rstest]
    #[case(VariableType::Integer, AnnotationValue::from("thirty"))]
    #[case(VariableType::Integer, AnnotationValue::Double(4.5))]
    #[case(VariableType::Integer, AnnotationValue::Bool(true))]
    #[case(VariableType::Boolean, AnnotationValue::from("maybe"))]
    #[case(VariableType::Date, AnnotationValue::from("yesterday"))]
    #[case(VariableType::String, AnnotationValue::List(vec![]))]
    fn rejects_wrong_shapes(#[case] expected: VariableType, #[case] input: AnnotationValue) {
        let err = coerce_scalar("v", expected, &input, true).unwrap_err();
        assert!(matches!(err, AnnotationError::TypeMismatch { .. }), "{err}");
    }

    #[test]
    fn strict_mode_rejects_spellings() {
        let err = coerce_scalar("age", VariableType::Integer, &"30".into(), false).unwrap_err();
        assert!(matches!(err, AnnotationError::TypeMismatch { .. }));
        assert!(coerce_scalar("name", VariableType::String, &7.into(), false).is_err());
    }

    #[test]
    fn numeric_ranges_parse_open_ends() {
        let range = NumericRange::parse(":10").unwrap();
        assert!(range.contains(-1e9));
        assert!(!range.contains(10.5));
        assert!(NumericRange::parse("5:1").is_err());
        assert!(NumericRange::parse("5").is_err());
        assert!(NumericRange::parse("a:1").is_err());
    }

    #[test]
    fn categorical_values_must_be_allowed() {
        let status = Variable::new("status", VariableType::Categorical)
            .with_allowed_values(["ALIVE", "DEAD"]);
        assert!(coerce_value("status", &status, &"ALIVE".into(), true).is_ok());
        let err = coerce_value("status", &status, &"UNKNOWN".into(), true).unwrap_err();
        assert!(matches!(err, AnnotationError::ValueNotAllowed { .. }));
    }

    #[test]
    fn numbers_must_fall_in_some_range() {
        let age = Variable::new("age", VariableType::Integer).with_allowed_values(["0:17", "65:"]);
        assert!(coerce_value("age", &age, &10.into(), true).is_ok());
        assert!(coerce_value("age", &age, &90.into(), true).is_ok());
        assert!(coerce_value("age", &age, &30.into(), true).is_err());
    }

    #[test]
    fn lists_require_multi_value() {
        let single = Variable::new("tag", VariableType::String);
        let list = AnnotationValue::List(vec!["a".into(), "b".into()]);
        assert!(matches!(
            coerce_value("tag", &single, &list, true),
            Err(AnnotationError::ValueNotAllowed { .. })
        ));

        let multi = Variable::new("tag", VariableType::String).multi_value();
        assert_eq!(coerce_value("tag", &multi, &list, true).unwrap(), list);
    }

    #[test]
    fn maps_check_entry_types_and_keys() {
        let scores = Variable::new("scores", VariableType::MapInteger).with_allowed_keys(["a", "b"]);
        let ok: AnnotationValue = serde_json::json!({"a": 1, "b": "2"}).into();
        let normalised = coerce_value("scores", &scores, &ok, true).unwrap();
        assert_eq!(normalised, serde_json::json!({"a": 1, "b": 2}).into());

        let bad_key: AnnotationValue = serde_json::json!({"c": 1}).into();
        assert!(matches!(
            coerce_value("scores", &scores, &bad_key, true),
            Err(AnnotationError::ValueNotAllowed { .. })
        ));

        let bad_type: AnnotationValue = serde_json::json!({"a": "x"}).into();
        assert!(matches!(
            coerce_value("scores", &scores, &bad_type, true),
            Err(AnnotationError::TypeMismatch { .. })
        ));
    }
}
