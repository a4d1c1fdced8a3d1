//! Update parameters, request options, and the decoded annotation update.
//!
//! Entity managers pass a generic string-keyed parameter map. The annotation
//! part of it lives under [`ANNOTATION_SETS`] (whole sets) or
//! [`ANNOTATIONS`] (field-level changes to one set), and the action for each
//! comes from the `actions` map of the request options. `AnnotationUpdate`
//! turns that into a closed enum once, before any dispatch.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use annot_core::entities::AnnotationSet;
use annot_core::enums::{SetAction, UpdateAction};
use annot_core::errors::AnnotationError;
use annot_schema::PayloadSchemaRegistry;

/// Request option holding the per-field action map.
pub const ACTIONS: &str = "actions";
/// Parameter key for whole annotation sets.
pub const ANNOTATION_SETS: &str = "annotationSets";
/// Parameter key for field-level changes to one annotation set.
pub const ANNOTATIONS: &str = "annotations";

const ANNOTATION_SET_SCHEMA: &str = "annotation_set";

// ---------------------------------------------------------------------------
// UpdateParams
// ---------------------------------------------------------------------------

/// The generic update parameter map shared with the persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateParams(Map<String, Value>);

impl UpdateParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `AnnotationError::Decode` if `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self, AnnotationError> {
        serde_json::from_value(value).map_err(|e| AnnotationError::decode("update parameters", &e))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for UpdateParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ---------------------------------------------------------------------------
// RequestOptions
// ---------------------------------------------------------------------------

/// Options of an update or search request that the annotation subsystem
/// reads: the `actions` map and the include/exclude projections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(default)]
    pub actions: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the action for `field` (`annotationSets` or `annotations`).
    #[must_use]
    pub fn with_action(mut self, field: &str, action: impl fmt::Display) -> Self {
        self.actions.insert(field.to_string(), action.to_string());
        self
    }

    #[must_use]
    pub fn with_include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn action(&self, field: &str) -> Option<&str> {
        self.actions.get(field).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// AnnotationUpdate
// ---------------------------------------------------------------------------

/// The annotation change carried by one update request.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationUpdate {
    /// Neither annotation key is present.
    Untouched,
    /// `annotationSets` is present but `null`.
    ClearSets,
    /// `annotations` is present but `null`.
    ClearAnnotations,
    /// Whole annotation sets to add, set or remove.
    WholeSets {
        action: SetAction,
        sets: Vec<AnnotationSet>,
    },
    /// Field-level change to the annotation set named by `payload.id`.
    Fields {
        action: UpdateAction,
        payload: AnnotationSet,
    },
}

impl AnnotationUpdate {
    /// Decode the annotation part of `params`.
    ///
    /// `annotationSets` takes precedence when both keys are present. Missing
    /// actions default to ADD. With `schemas`, every raw annotation set is
    /// checked against its JSON Schema before the typed decode.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAction` for unrecognised actions and `Decode` for
    /// payloads that are not annotation sets (or a non-list
    /// `annotationSets`).
    pub fn decode(
        params: &UpdateParams,
        options: &RequestOptions,
        schemas: Option<&PayloadSchemaRegistry>,
    ) -> Result<Self, AnnotationError> {
        if let Some(raw) = params.get(ANNOTATION_SETS) {
            let items = match raw {
                Value::Null => return Ok(Self::ClearSets),
                Value::Array(items) => items,
                other => {
                    return Err(AnnotationError::Decode {
                        context: ANNOTATION_SETS.into(),
                        message: format!(
                            "must be a list of annotation sets, found {}",
                            json_kind(other)
                        ),
                    });
                }
            };
            let action = options
                .action(ANNOTATION_SETS)
                .map(str::parse::<SetAction>)
                .transpose()?
                .unwrap_or_default();
            let sets = items
                .iter()
                .map(|item| decode_set(ANNOTATION_SETS, item, schemas))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Self::WholeSets { action, sets });
        }

        if let Some(raw) = params.get(ANNOTATIONS) {
            let raw = match raw {
                Value::Null => return Ok(Self::ClearAnnotations),
                Value::Array(items) if items.len() == 1 => &items[0],
                Value::Array(items) => {
                    return Err(AnnotationError::MultipleAnnotationSets { count: items.len() });
                }
                single => single,
            };
            let action = options
                .action(ANNOTATIONS)
                .map(str::parse::<UpdateAction>)
                .transpose()?
                .unwrap_or_default();
            let payload = decode_set(ANNOTATIONS, raw, schemas)?;
            return Ok(Self::Fields { action, payload });
        }

        Ok(Self::Untouched)
    }
}

fn decode_set(
    context: &str,
    raw: &Value,
    schemas: Option<&PayloadSchemaRegistry>,
) -> Result<AnnotationSet, AnnotationError> {
    if let Some(schemas) = schemas {
        schemas
            .validate(ANNOTATION_SET_SCHEMA, raw)
            .map_err(|err| match err {
                AnnotationError::Decode { message, .. } => AnnotationError::Decode {
                    context: context.to_string(),
                    message,
                },
                other => other,
            })?;
    }
    AnnotationSet::deserialize(raw).map_err(|e| AnnotationError::decode(context, &e))
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
