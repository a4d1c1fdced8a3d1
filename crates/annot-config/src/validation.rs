//! Annotation validation settings.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default coercion of scalar spellings.
const fn default_coerce_scalars() -> bool {
    true
}

/// Default maximum object nesting depth.
const fn default_max_depth() -> u32 {
    16
}

/// Default payload schema check.
const fn default_check_payload_schema() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// Accept string/number spellings of scalars (`"30"` for an INTEGER,
    /// `"true"` for a BOOLEAN) and normalise them to the declared type.
    #[serde(default = "default_coerce_scalars")]
    pub coerce_scalars: bool,

    /// Maximum depth of nested OBJECT variables the validator descends into.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Validate raw annotation set payloads against their JSON Schema before
    /// decoding them.
    #[serde(default = "default_check_payload_schema")]
    pub check_payload_schema: bool,
}

impl ValidationConfig {
    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `max_depth` is zero.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "validation.max_depth".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            coerce_scalars: default_coerce_scalars(),
            max_depth: default_max_depth(),
            check_payload_schema: default_check_payload_schema(),
        }
    }
}
