//! Entity structs for annotation schemas and annotation data.
//!
//! Field names serialize in camelCase because annotation sets travel inside
//! the generic update-parameters map (`annotationSets`, `variableSetId`).
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON
//! roundtrip and payload schema validation.

mod annotation_set;
mod study;
mod variable;
mod variable_set;

pub use annotation_set::AnnotationSet;
pub use study::{EntityRef, Study};
pub use variable::Variable;
pub use variable_set::VariableSet;
