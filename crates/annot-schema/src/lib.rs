//! # annot-schema
//!
//! Read-only schema layer for annotations.
//!
//! This crate provides:
//! - `VariableSetCatalog`: lookup of a study's variable sets by id
//! - Dotted-path variable resolution (`address.city`)
//! - Definition checks for variable sets supplied by study configuration
//! - Scalar coercion and allowed-value enforcement per `VariableType`
//! - Flattened `path -> QueryFieldType` maps used by annotation queries
//! - `PayloadSchemaRegistry`: JSON Schemas of the wire types for boundary checks
//!
//! ## Architecture
//!
//! Types are defined in `annot-core`. This crate never mutates a variable set;
//! `annot-catalog` builds validation and updates on top of it.

pub mod catalog;
pub mod coerce;
pub mod definition;
pub mod flatten;
pub mod lookup;
pub mod registry;

pub use catalog::VariableSetCatalog;
pub use definition::check_variable_set;
pub use flatten::{QueryFieldType, variable_type_map};
pub use lookup::{contains_variable_path, find_variable, resolve_variable, split_path};
pub use registry::PayloadSchemaRegistry;
