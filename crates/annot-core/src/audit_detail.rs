//! Typed audit detail payloads.
//!
//! The annotation manager does not write audit records itself. It returns an
//! `AnnotationChangeDetail` describing the accepted change, which the calling
//! entity manager attaches to the audit entry it records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which field of the update parameters carried the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationUpdateMode {
    /// Whole annotation sets were added, replaced or removed.
    AnnotationSets,
    /// Individual annotations of one annotation set were changed.
    Annotations,
}

/// Detail for an accepted annotation change.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AnnotationChangeDetail {
    pub mode: AnnotationUpdateMode,
    /// Wire name of the applied action (`ADD`, `RESET`, ...).
    pub action: String,
    pub annotation_set_ids: Vec<String>,
    pub variable_set_ids: Vec<String>,
}
