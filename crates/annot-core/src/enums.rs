//! Variable types, entity types, permissions, and update actions.
//!
//! Wire names follow the catalog's upper snake case convention
//! (`#[serde(rename_all = "SCREAMING_SNAKE_CASE")]`). Update actions also
//! parse case-insensitively through `FromStr`, because request options carry
//! them as free-form strings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AnnotationError;

// ---------------------------------------------------------------------------
// VariableType
// ---------------------------------------------------------------------------

/// Declared type of a `Variable`.
///
/// `TEXT` is accepted as an alias of `STRING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariableType {
    Boolean,
    Categorical,
    Integer,
    Double,
    #[serde(alias = "TEXT")]
    String,
    Date,
    Object,
    MapBoolean,
    MapInteger,
    MapDouble,
    MapString,
}

impl VariableType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Categorical => "CATEGORICAL",
            Self::Integer => "INTEGER",
            Self::Double => "DOUBLE",
            Self::String => "STRING",
            Self::Date => "DATE",
            Self::Object => "OBJECT",
            Self::MapBoolean => "MAP_BOOLEAN",
            Self::MapInteger => "MAP_INTEGER",
            Self::MapDouble => "MAP_DOUBLE",
            Self::MapString => "MAP_STRING",
        }
    }

    /// Whether values of this type are string-keyed maps of scalars.
    #[must_use]
    pub const fn is_map(self) -> bool {
        matches!(
            self,
            Self::MapBoolean | Self::MapInteger | Self::MapDouble | Self::MapString
        )
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Double)
    }

    /// Scalar type of the entries of a map type. `None` for non-map types.
    #[must_use]
    pub const fn map_value_type(self) -> Option<Self> {
        match self {
            Self::MapBoolean => Some(Self::Boolean),
            Self::MapInteger => Some(Self::Integer),
            Self::MapDouble => Some(Self::Double),
            Self::MapString => Some(Self::String),
            _ => None,
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Type tag of an annotable catalog entity. Variable sets may restrict the
/// entity types they can annotate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Sample,
    Individual,
    Cohort,
    Family,
    File,
    ClinicalAnalysis,
    DiseasePanel,
    Execution,
    Workflow,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sample => "SAMPLE",
            Self::Individual => "INDIVIDUAL",
            Self::Cohort => "COHORT",
            Self::Family => "FAMILY",
            Self::File => "FILE",
            Self::ClinicalAnalysis => "CLINICAL_ANALYSIS",
            Self::DiseasePanel => "DISEASE_PANEL",
            Self::Execution => "EXECUTION",
            Self::Workflow => "WORKFLOW",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StudyPermission
// ---------------------------------------------------------------------------

/// Study-level permissions the annotation manager asks the authorization
/// collaborator about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudyPermission {
    ConfidentialVariableSetAccess,
}

impl StudyPermission {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfidentialVariableSetAccess => "CONFIDENTIAL_VARIABLE_SET_ACCESS",
        }
    }
}

impl fmt::Display for StudyPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SetAction
// ---------------------------------------------------------------------------

/// Action applied to whole annotation sets (the `annotationSets` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetAction {
    #[default]
    Add,
    Set,
    Remove,
}

impl SetAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Set => "SET",
            Self::Remove => "REMOVE",
        }
    }
}

impl fmt::Display for SetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetAction {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADD" => Ok(Self::Add),
            "SET" => Ok(Self::Set),
            "REMOVE" => Ok(Self::Remove),
            _ => Err(AnnotationError::UnknownAction {
                field: "annotationSets".into(),
                action: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// UpdateAction
// ---------------------------------------------------------------------------

/// Field-level action applied to the annotations of a single annotation set
/// (the `annotations` field).
///
/// ```text
/// ADD      merge payload keys, overwriting
/// SET      replace the whole map
/// REPLACE  overwrite only keys that already exist
/// RESET    put listed paths back to their default value
/// REMOVE   delete listed non-required paths
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateAction {
    #[default]
    Add,
    Set,
    Replace,
    Reset,
    Remove,
}

impl UpdateAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Set => "SET",
            Self::Replace => "REPLACE",
            Self::Reset => "RESET",
            Self::Remove => "REMOVE",
        }
    }

    /// Key a RESET/REMOVE payload must use for its comma-separated path list.
    #[must_use]
    pub const fn path_list_key(self) -> Option<&'static str> {
        match self {
            Self::Reset => Some("reset"),
            Self::Remove => Some("remove"),
            Self::Add | Self::Set | Self::Replace => None,
        }
    }
}

impl fmt::Display for UpdateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateAction {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADD" => Ok(Self::Add),
            "SET" => Ok(Self::Set),
            "REPLACE" => Ok(Self::Replace),
            "RESET" => Ok(Self::Reset),
            "REMOVE" => Ok(Self::Remove),
            _ => Err(AnnotationError::UnknownAction {
                field: "annotations".into(),
                action: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Serde roundtrip tests ---

    macro_rules! test_serde_roundtrip {
        ($name:ident, $ty:ty, $variant:expr, $expected_str:expr) => {
            #[test]
            fn $name() {
                let val = $variant;
                let json = serde_json::to_string(&val).unwrap();
                assert_eq!(json, format!("\"{}\"", $expected_str));
                let recovered: $ty = serde_json::from_str(&json).unwrap();
                assert_eq!(recovered, val);
            }
        };
    }

    test_serde_roundtrip!(vt_map_double, VariableType, VariableType::MapDouble, "MAP_DOUBLE");
    test_serde_roundtrip!(vt_object, VariableType, VariableType::Object, "OBJECT");
    test_serde_roundtrip!(
        entity_clinical,
        EntityType,
        EntityType::ClinicalAnalysis,
        "CLINICAL_ANALYSIS"
    );
    test_serde_roundtrip!(set_action_remove, SetAction, SetAction::Remove, "REMOVE");
    test_serde_roundtrip!(update_action_reset, UpdateAction, UpdateAction::Reset, "RESET");
    test_serde_roundtrip!(
        perm_confidential,
        StudyPermission,
        StudyPermission::ConfidentialVariableSetAccess,
        "CONFIDENTIAL_VARIABLE_SET_ACCESS"
    );

    #[test]
    fn text_is_an_alias_of_string() {
        let vt: VariableType = serde_json::from_str("\"TEXT\"").unwrap();
        assert_eq!(vt, VariableType::String);
    }

    #[test]
    fn as_str_matches_serde() {
        for vt in [
            VariableType::Boolean,
            VariableType::Categorical,
            VariableType::Integer,
            VariableType::Double,
            VariableType::String,
            VariableType::Date,
            VariableType::Object,
            VariableType::MapBoolean,
            VariableType::MapInteger,
            VariableType::MapDouble,
            VariableType::MapString,
        ] {
            let json = serde_json::to_string(&vt).unwrap();
            assert_eq!(json, format!("\"{}\"", vt.as_str()));
        }
    }

    #[test]
    fn map_types_know_their_value_type() {
        assert_eq!(
            VariableType::MapInteger.map_value_type(),
            Some(VariableType::Integer)
        );
        assert_eq!(VariableType::Object.map_value_type(), None);
        assert!(VariableType::MapString.is_map());
        assert!(!VariableType::Object.is_map());
    }

    #[test]
    fn actions_parse_case_insensitively() {
        assert_eq!("replace".parse::<UpdateAction>().unwrap(), UpdateAction::Replace);
        assert_eq!("Set".parse::<SetAction>().unwrap(), SetAction::Set);
        assert!("RESET".parse::<SetAction>().is_err());
        assert!("merge".parse::<UpdateAction>().is_err());
    }

    #[test]
    fn defaults_are_add() {
        assert_eq!(SetAction::default(), SetAction::Add);
        assert_eq!(UpdateAction::default(), UpdateAction::Add);
    }

    #[test]
    fn only_reset_and_remove_use_path_lists() {
        assert_eq!(UpdateAction::Reset.path_list_key(), Some("reset"));
        assert_eq!(UpdateAction::Remove.path_list_key(), Some("remove"));
        assert_eq!(UpdateAction::Add.path_list_key(), None);
    }
}
