//! JSON Schemas of the annotation wire types.
//!
//! `PayloadSchemaRegistry` builds the schemas from `annot-core` types with
//! [`schemars::schema_for!`] once, and validates raw request payloads with
//! `jsonschema` before they are decoded. Reporting every violation at once
//! gives callers a better message than serde's first-error decode.

use std::collections::HashMap;

use schemars::schema_for;

use annot_core::errors::AnnotationError;

/// Registry of payload schemas, keyed by snake_case type name.
pub struct PayloadSchemaRegistry {
    schemas: HashMap<&'static str, serde_json::Value>,
}

macro_rules! register {
    ($map:expr, $name:expr, $ty:ty) => {
        $map.insert($name, schema_for!($ty).to_value());
    };
}

impl PayloadSchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        let mut schemas = HashMap::new();

        register!(schemas, "variable", annot_core::entities::Variable);
        register!(schemas, "variable_set", annot_core::entities::VariableSet);
        register!(schemas, "annotation_set", annot_core::entities::AnnotationSet);
        register!(schemas, "study", annot_core::entities::Study);
        register!(
            schemas,
            "annotation_change_detail",
            annot_core::audit_detail::AnnotationChangeDetail
        );

        Self { schemas }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.schemas.get(name)
    }

    /// Validate a JSON value against a named schema.
    ///
    /// # Errors
    ///
    /// Returns `AnnotationError::Decode` listing every violation, or
    /// `AnnotationError::InternalValidation` if `name` is not registered.
    pub fn validate(&self, name: &str, instance: &serde_json::Value) -> Result<(), AnnotationError> {
        let schema = self
            .get(name)
            .ok_or_else(|| AnnotationError::InternalValidation {
                path: name.to_string(),
                reason: "no payload schema registered".into(),
            })?;

        let validator =
            jsonschema::validator_for(schema).map_err(|e| AnnotationError::InternalValidation {
                path: name.to_string(),
                reason: format!("payload schema does not compile: {e}"),
            })?;

        let errors: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| format!("{e}"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AnnotationError::Decode {
                context: name.to_string(),
                message: errors.join("; "),
            })
        }
    }

    /// Registered schema names, sorted.
    #[must_use]
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.schemas.keys().copied().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}

impl Default for PayloadSchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annot_core::entities::AnnotationSet;
    use annot_core::value::AnnotationValue;

    #[test]
    fn registers_every_wire_type() {
        let reg = PayloadSchemaRegistry::new();
        assert_eq!(reg.schema_count(), 5);
        assert_eq!(
            reg.list(),
            vec![
                "annotation_change_detail",
                "annotation_set",
                "study",
                "variable",
                "variable_set"
            ]
        );
    }

    #[test]
    fn accepts_serialized_annotation_set() {
        let reg = PayloadSchemaRegistry::new();
        let mut set = AnnotationSet::new("set1", "vs1", Default::default());
        set.annotations
            .insert("age".into(), AnnotationValue::Int(30));
        let json = serde_json::to_value(&set).unwrap();
        reg.validate("annotation_set", &json).unwrap();
    }

    #[test]
    fn reports_all_violations() {
        let reg = PayloadSchemaRegistry::new();
        let bad = serde_json::json!({
            "id": 7,
            "variableSetId": ["vs1"],
            "annotations": {"age": 30}
        });
        match reg.validate("annotation_set", &bad) {
            Err(AnnotationError::Decode { context, message }) => {
                assert_eq!(context, "annotation_set");
                assert!(message.contains(';'), "expected several errors: {message}");
            }
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_variable_type() {
        let reg = PayloadSchemaRegistry::new();
        let bad = serde_json::json!({"id": "age", "type": "NUMBER"});
        assert!(reg.validate("variable", &bad).is_err());
    }

    #[test]
    fn unknown_schema_is_internal() {
        let reg = PayloadSchemaRegistry::new();
        assert!(matches!(
            reg.validate("nope", &serde_json::Value::Null),
            Err(AnnotationError::InternalValidation { .. })
        ));
    }
}
