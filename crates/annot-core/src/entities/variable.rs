use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::VariableType;
use crate::value::AnnotationValue;

/// A single field definition of a variable set.
///
/// OBJECT variables carry their own nested `variables`; every other type
/// leaves it empty. `allowedValues` holds categorical choices, or `min:max`
/// ranges for numeric types (either end may be empty).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: String,
    #[serde(rename = "type")]
    pub variable_type: VariableType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multi_value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<AnnotationValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Variable {
    #[must_use]
    pub fn new(id: impl Into<String>, variable_type: VariableType) -> Self {
        Self {
            id: id.into(),
            variable_type,
            required: false,
            multi_value: false,
            default_value: None,
            allowed_values: Vec::new(),
            allowed_keys: Vec::new(),
            variables: Vec::new(),
            description: None,
        }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn multi_value(mut self) -> Self {
        self.multi_value = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<AnnotationValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_allowed_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_variables(mut self, variables: Vec<Self>) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether a default value is declared (a declared `null` counts as none).
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default_value.as_ref().is_some_and(|v| !v.is_null())
    }
}
