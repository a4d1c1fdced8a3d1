//! Shared fixtures for annot-catalog integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use annot_catalog::AnnotationSetManager;
use annot_catalog::test_support::RecordingPermissionChecker;
use annot_config::ValidationConfig;
use annot_core::entities::{AnnotationSet, EntityRef, Study, Variable, VariableSet};
use annot_core::enums::{EntityType, VariableType};
use annot_core::identity::UserIdentity;
use annot_core::value::{AnnotationMap, AnnotationValue};

pub const STUDY: &str = "org@proj:study";
pub const ENTITY: &str = "smp-0001";

/// `VS1`: `age` (required, default 0) and optional `notes`.
pub fn vs1() -> VariableSet {
    VariableSet::new(
        "VS1",
        vec![
            Variable::new("age", VariableType::Integer)
                .required()
                .with_default(0),
            Variable::new("notes", VariableType::String),
        ],
    )
}

/// `address` object with a defaulted `city` and free `zip`.
pub fn geo() -> VariableSet {
    VariableSet::new(
        "geo",
        vec![Variable::new("address", VariableType::Object).with_variables(vec![
            Variable::new("city", VariableType::String).with_default("Unknown"),
            Variable::new("zip", VariableType::String),
        ])],
    )
}

pub fn secret() -> VariableSet {
    VariableSet::new(
        "secret",
        vec![Variable::new("diagnosis", VariableType::String)],
    )
    .confidential()
}

pub fn secret_two() -> VariableSet {
    VariableSet::new(
        "secret2",
        vec![Variable::new("code", VariableType::Integer)],
    )
    .confidential()
}

pub fn study() -> Study {
    Study::new(
        STUDY,
        vec![
            vs1(),
            geo(),
            secret(),
            secret_two(),
            VariableSet::new("once", vec![Variable::new("x", VariableType::Integer)]).unique(),
            VariableSet::new("individuals", vec![Variable::new("y", VariableType::Integer)])
                .with_entities(vec![EntityType::Individual]),
        ],
    )
}

pub fn entity() -> EntityRef {
    EntityRef::new(ENTITY, EntityType::Sample)
}

pub fn user() -> UserIdentity {
    UserIdentity::new("user1")
}

pub fn annotations(value: serde_json::Value) -> AnnotationMap {
    match AnnotationValue::from(value) {
        AnnotationValue::Object(map) => map,
        other => panic!("expected an object, got {other:?}"),
    }
}

pub fn set(id: &str, variable_set: &str, value: serde_json::Value) -> AnnotationSet {
    AnnotationSet::new(id, variable_set, annotations(value))
}

/// A manager with default configuration and an allowing, recording checker.
pub fn manager() -> (AnnotationSetManager, Arc<RecordingPermissionChecker>) {
    manager_with(RecordingPermissionChecker::allowing())
}

pub fn manager_with(
    checker: RecordingPermissionChecker,
) -> (AnnotationSetManager, Arc<RecordingPermissionChecker>) {
    let checker = Arc::new(checker);
    let manager = AnnotationSetManager::new(&ValidationConfig::default(), checker.clone());
    (manager, checker)
}

/// Decode the `annotationSets` parameter back into typed sets.
pub fn written_sets(params: &annot_catalog::UpdateParams) -> Vec<AnnotationSet> {
    let raw = params
        .get("annotationSets")
        .cloned()
        .expect("annotationSets written");
    serde_json::from_value(raw).expect("annotation sets decode")
}
