//! # annot-catalog
//!
//! Validation and incremental updates of annotation sets, and the
//! `AnnotationSetManager` that entity managers call when an entity is created
//! or updated.
//!
//! ## Layers
//!
//! - [`validator`]: checks a candidate annotation map against its variable set
//!   and fills in defaults.
//! - [`collision`]: annotation set id uniqueness and unique variable sets,
//!   checked incrementally across a batch.
//! - [`engine`]: pure ADD/SET/REPLACE/RESET/REMOVE application on one set.
//! - [`manager`]: decodes the update request once, dispatches, and writes the
//!   result back into the update parameters for the persistence layer.
//!
//! Persistence and authorization stay outside this crate, behind the
//! [`ports`] traits.

pub mod collision;
pub mod engine;
pub mod gate;
pub mod manager;
pub mod params;
pub mod ports;
pub mod projection;
pub mod query;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validator;

pub use collision::{BatchGuard, check_no_collision, check_unique_variable_set};
pub use gate::ConfidentialGate;
pub use manager::AnnotationSetManager;
pub use params::{AnnotationUpdate, RequestOptions, UpdateParams};
pub use ports::{AnnotationSetReader, PermissionChecker};
pub use projection::normalize_projection;
pub use query::NormalizedQuery;
pub use validator::{ValidationMode, Validator};
