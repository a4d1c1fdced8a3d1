use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::EntityType;

use super::Variable;

/// A study-scoped annotation schema.
///
/// `entities` restricts which entity types may be annotated with it; an empty
/// list means unrestricted. A `unique` variable set can back at most one
/// annotation set per entity. Annotating with a `confidential` variable set
/// requires the `CONFIDENTIAL_VARIABLE_SET_ACCESS` study permission.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariableSet {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub confidential: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub entities: Vec<EntityType>,
}

impl VariableSet {
    #[must_use]
    pub fn new(id: impl Into<String>, variables: Vec<Variable>) -> Self {
        Self {
            id: id.into(),
            name: None,
            unique: false,
            confidential: false,
            description: None,
            variables,
            entities: Vec::new(),
        }
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub const fn confidential(mut self) -> Self {
        self.confidential = true;
        self
    }

    #[must_use]
    pub fn with_entities(mut self, entities: Vec<EntityType>) -> Self {
        self.entities = entities;
        self
    }

    /// Whether this variable set may annotate entities of `entity_type`.
    #[must_use]
    pub fn allows_entity(&self, entity_type: EntityType) -> bool {
        self.entities.is_empty() || self.entities.contains(&entity_type)
    }
}
