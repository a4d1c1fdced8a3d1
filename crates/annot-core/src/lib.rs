//! # annot-core
//!
//! Core types and error taxonomy for the annotation catalog.
//!
//! This crate provides the foundational types shared across all annot crates:
//! - `AnnotationValue`, the recursive value carried by annotation maps
//! - Entity structs for variable sets, variables, annotation sets and studies
//! - Variable type, entity type, and update action enums
//! - The `AnnotationError` taxonomy with its error categories
//! - Audit detail payloads describing an accepted annotation change

pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod value;
