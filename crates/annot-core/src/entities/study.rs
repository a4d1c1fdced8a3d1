use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::EntityType;

use super::VariableSet;

/// The slice of a study the annotation subsystem needs: its identifier and
/// the variable sets already loaded by the study configuration provider.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    /// Fully qualified study name, e.g. `org@project:study`.
    pub fqn: String,
    #[serde(default)]
    pub variable_sets: Vec<VariableSet>,
}

impl Study {
    #[must_use]
    pub fn new(fqn: impl Into<String>, variable_sets: Vec<VariableSet>) -> Self {
        Self {
            fqn: fqn.into(),
            variable_sets,
        }
    }
}

/// Reference to the annotable entity being created or updated.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    /// Internal unique id used by the persistence layer.
    pub uid: String,
    pub entity_type: EntityType,
}

impl EntityRef {
    #[must_use]
    pub fn new(uid: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            uid: uid.into(),
            entity_type,
        }
    }
}
