//! Flattened `path -> QueryFieldType` maps used to type annotation queries.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use annot_core::entities::{Variable, VariableSet};
use annot_core::enums::VariableType;

/// Query-side type of a flattened annotation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryFieldType {
    Boolean,
    BooleanArray,
    Text,
    TextArray,
    Integer,
    IntegerArray,
    Decimal,
    DecimalArray,
}

impl QueryFieldType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::BooleanArray => "BOOLEAN_ARRAY",
            Self::Text => "TEXT",
            Self::TextArray => "TEXT_ARRAY",
            Self::Integer => "INTEGER",
            Self::IntegerArray => "INTEGER_ARRAY",
            Self::Decimal => "DECIMAL",
            Self::DecimalArray => "DECIMAL_ARRAY",
        }
    }

    /// Field type for a leaf variable. `None` for OBJECT.
    #[must_use]
    pub const fn for_variable(variable_type: VariableType, multi_value: bool) -> Option<Self> {
        let (single, array) = match variable_type {
            VariableType::Boolean | VariableType::MapBoolean => {
                (Self::Boolean, Self::BooleanArray)
            }
            VariableType::Categorical
            | VariableType::String
            | VariableType::Date
            | VariableType::MapString => (Self::Text, Self::TextArray),
            VariableType::Integer | VariableType::MapInteger => (Self::Integer, Self::IntegerArray),
            VariableType::Double | VariableType::MapDouble => (Self::Decimal, Self::DecimalArray),
            VariableType::Object => return None,
        };
        Some(if multi_value { array } else { single })
    }
}

impl fmt::Display for QueryFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Pending<'a> {
    variable: &'a Variable,
    prefix: Vec<&'a str>,
    multi_value: bool,
}

/// Walk a variable set breadth-first and map every leaf path to its query
/// type.
///
/// OBJECT variables are expanded into their children. A multi-value OBJECT
/// turns every descendant into an array type. MAP variables contribute a
/// `path.*` entry standing for any dynamic key.
#[must_use]
pub fn variable_type_map(variable_set: &VariableSet) -> BTreeMap<String, QueryFieldType> {
    let mut out = BTreeMap::new();
    let mut queue: VecDeque<Pending<'_>> = variable_set
        .variables
        .iter()
        .map(|variable| Pending {
            variable,
            prefix: Vec::new(),
            multi_value: variable.multi_value,
        })
        .collect();

    while let Some(Pending {
        variable,
        prefix,
        multi_value,
    }) = queue.pop_front()
    {
        let mut keys = prefix;
        keys.push(variable.id.as_str());

        match QueryFieldType::for_variable(variable.variable_type, multi_value) {
            None => {
                for nested in &variable.variables {
                    queue.push_back(Pending {
                        variable: nested,
                        prefix: keys.clone(),
                        multi_value: multi_value || nested.multi_value,
                    });
                }
            }
            Some(field_type) => {
                if variable.variable_type.is_map() {
                    keys.push("*");
                }
                out.insert(keys.join("."), field_type);
            }
        }
    }

    out
}
