use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value::AnnotationMap;

/// A named set of annotations bound to one variable set, owned by a single
/// catalog entity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationSet {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub variable_set_id: String,
    #[serde(default)]
    pub annotations: AnnotationMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
}

impl AnnotationSet {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        variable_set_id: impl Into<String>,
        annotations: AnnotationMap,
    ) -> Self {
        Self {
            id: id.into(),
            variable_set_id: variable_set_id.into(),
            annotations,
            creation_date: None,
        }
    }
}
