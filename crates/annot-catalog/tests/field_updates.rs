//! Field-level annotation updates through `AnnotationSetManager`.

mod common;

use annot_catalog::test_support::InMemoryReader;
use annot_catalog::{RequestOptions, UpdateParams};
use annot_core::audit_detail::AnnotationUpdateMode;
use annot_core::enums::UpdateAction;
use annot_core::errors::{AnnotationError, ErrorCategory};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use common::*;

fn reader() -> InMemoryReader {
    InMemoryReader::new().with_sets(
        ENTITY,
        vec![
            set("clinical", "VS1", json!({"age": 30, "notes": "first visit"})),
            set(
                "home",
                "geo",
                json!({"address": {"city": "Madrid", "zip": "28001"}}),
            ),
        ],
    )
}

fn run(
    action: UpdateAction,
    payload: serde_json::Value,
) -> (Result<Option<annot_core::audit_detail::AnnotationChangeDetail>, AnnotationError>, UpdateParams) {
    let (manager, _) = manager();
    let mut p = UpdateParams::from_value(json!({ "annotations": payload })).unwrap();
    let options = RequestOptions::new().with_action("annotations", action);
    let result = manager.check_update_annotations(&study(), &entity(), &mut p, &options, &reader(), &user());
    (result, p)
}

#[test]
fn add_merges_and_moves_result_to_annotation_sets() {
    let (result, p) = run(
        UpdateAction::Add,
        json!({"id": "clinical", "annotations": {"notes": "second visit"}}),
    );
    let detail = result.unwrap().unwrap();
    assert_eq!(detail.mode, AnnotationUpdateMode::Annotations);
    assert_eq!(detail.action, "ADD");
    assert_eq!(detail.annotation_set_ids, vec!["clinical"]);

    assert!(!p.contains_key("annotations"));
    let sets = written_sets(&p);
    assert_eq!(sets.len(), 1);
    assert_eq!(
        sets[0].annotations,
        annotations(json!({"age": 30, "notes": "second visit"}))
    );
    assert_eq!(sets[0].variable_set_id, "VS1");
}

#[test]
fn add_revalidates_types() {
    let (result, _) = run(
        UpdateAction::Add,
        json!({"id": "clinical", "annotations": {"age": "thirty"}}),
    );
    let err = result.unwrap_err();
    assert!(matches!(err, AnnotationError::TypeMismatch { .. }));
    assert_eq!(err.category(), ErrorCategory::Schema);
}

#[test]
fn set_clears_then_fills_required_default() {
    let (result, p) = run(
        UpdateAction::Set,
        json!({"id": "clinical", "annotations": {"notes": "only"}}),
    );
    result.unwrap();
    assert_eq!(
        written_sets(&p)[0].annotations,
        annotations(json!({"age": 0, "notes": "only"}))
    );
}

#[test]
fn replace_of_unknown_key_changes_nothing() {
    let (result, p) = run(
        UpdateAction::Replace,
        json!({"id": "clinical", "annotations": {"unknownKey": 1}}),
    );
    result.unwrap();
    assert_eq!(
        written_sets(&p)[0].annotations,
        annotations(json!({"age": 30, "notes": "first visit"}))
    );
}

#[test]
fn reset_nested_city_to_default() {
    let (result, p) = run(
        UpdateAction::Reset,
        json!({"id": "home", "annotations": {"reset": "address.city"}}),
    );
    result.unwrap();
    assert_eq!(
        written_sets(&p)[0].annotations,
        annotations(json!({"address": {"city": "Unknown", "zip": "28001"}}))
    );
}

#[test]
fn reset_top_level_to_default() {
    let (result, p) = run(
        UpdateAction::Reset,
        json!({"id": "clinical", "annotations": {"reset": "age"}}),
    );
    result.unwrap();
    assert_eq!(
        written_sets(&p)[0].annotations,
        annotations(json!({"age": 0, "notes": "first visit"}))
    );
}

#[test]
fn remove_required_is_rejected_and_params_unchanged() {
    let (manager, _) = manager();
    let mut p = UpdateParams::from_value(json!({
        "annotations": {"id": "clinical", "annotations": {"remove": "age"}}
    }))
    .unwrap();
    let before = p.clone();
    let options = RequestOptions::new().with_action("annotations", UpdateAction::Remove);

    let err = manager
        .check_update_annotations(&study(), &entity(), &mut p, &options, &reader(), &user())
        .unwrap_err();
    assert!(matches!(err, AnnotationError::CannotRemoveRequired { ref path } if path == "age"));
    assert_eq!(err.category(), ErrorCategory::UpdateSemantics);
    assert_eq!(p, before);
}

#[test]
fn remove_optional_value() {
    let (result, p) = run(
        UpdateAction::Remove,
        json!({"id": "clinical", "annotations": {"remove": "notes"}}),
    );
    result.unwrap();
    assert_eq!(written_sets(&p)[0].annotations, annotations(json!({"age": 30})));
}

#[rstest]
#[case(UpdateAction::Add, json!({"id": "clinical", "annotations": {}}))]
#[case(UpdateAction::Replace, json!({"id": "clinical"}))]
#[case(UpdateAction::Reset, json!({"id": "clinical", "annotations": {"age": 1}}))]
#[case(UpdateAction::Remove, json!({"id": "clinical", "annotations": {"remove": "notes", "reset": "age"}}))]
fn malformed_payloads_are_update_semantics_errors(
    #[case] action: UpdateAction,
    #[case] payload: serde_json::Value,
) {
    let (result, _) = run(action, payload);
    assert_eq!(result.unwrap_err().category(), ErrorCategory::UpdateSemantics);
}

#[test]
fn missing_set_is_a_conflict() {
    let (result, _) = run(
        UpdateAction::Add,
        json!({"id": "nope", "annotations": {"age": 1}}),
    );
    assert!(matches!(result.unwrap_err(), AnnotationError::AnnotationSetNotFound { ref id } if id == "nope"));
}

#[test]
fn payload_needs_an_id() {
    let (result, _) = run(UpdateAction::Add, json!({"annotations": {"age": 1}}));
    assert!(matches!(result.unwrap_err(), AnnotationError::MissingParameter { .. }));
}

#[test]
fn more_than_one_payload_is_rejected() {
    let (result, _) = run(
        UpdateAction::Add,
        json!([{"id": "clinical"}, {"id": "home"}]),
    );
    assert!(matches!(result.unwrap_err(), AnnotationError::MultipleAnnotationSets { count: 2 }));
}

#[test]
fn null_annotations_are_dropped() {
    let (result, p) = run(UpdateAction::Add, serde_json::Value::Null);
    assert!(result.unwrap().is_none());
    assert!(!p.contains_key("annotations"));
    assert!(!p.contains_key("annotationSets"));
}
