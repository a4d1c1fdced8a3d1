//! Annotation set orchestration for entity managers.
//!
//! `AnnotationSetManager` is what the sample, cohort, family (and other
//! annotable entity) managers call while creating or updating an entity. It
//! decodes the annotation part of the request once, validates or applies it,
//! and leaves the final annotation sets in the update parameters under
//! `annotationSets` for the persistence layer to write.
//!
//! Every call is self-contained: the study, the persisted sets (through the
//! reader) and the acting user come in as arguments, and no state survives
//! the call except what is written back into the parameters.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use annot_config::ValidationConfig;
use annot_core::audit_detail::{AnnotationChangeDetail, AnnotationUpdateMode};
use annot_core::entities::{AnnotationSet, EntityRef, Study};
use annot_core::enums::{EntityType, SetAction, UpdateAction};
use annot_core::errors::AnnotationError;
use annot_core::identity::UserIdentity;
use annot_schema::{PayloadSchemaRegistry, VariableSetCatalog};

use crate::collision::BatchGuard;
use crate::engine;
use crate::gate::ConfidentialGate;
use crate::params::{ANNOTATION_SETS, ANNOTATIONS, AnnotationUpdate, RequestOptions, UpdateParams};
use crate::ports::{AnnotationSetReader, PermissionChecker};
use crate::query::{NormalizedQuery, normalize_annotation_query};
use crate::validator::{ValidationMode, Validator};

const ANNOTATION_SET_ID: &str = "annotationSet id";

/// Entry point of the annotation subsystem.
pub struct AnnotationSetManager {
    permissions: Arc<dyn PermissionChecker>,
    validator: Validator,
    schemas: PayloadSchemaRegistry,
    check_payload_schema: bool,
}

impl AnnotationSetManager {
    #[must_use]
    pub fn new(config: &ValidationConfig, permissions: Arc<dyn PermissionChecker>) -> Self {
        Self {
            permissions,
            validator: Validator::new(config),
            schemas: PayloadSchemaRegistry::new(),
            check_payload_schema: config.check_payload_schema,
        }
    }

    #[must_use]
    pub const fn validator(&self) -> &Validator {
        &self.validator
    }

    #[must_use]
    pub const fn schemas(&self) -> &PayloadSchemaRegistry {
        &self.schemas
    }

    /// Validate and normalise the annotation changes of an entity update.
    ///
    /// On success `params` holds the final annotation sets under
    /// `annotationSets` (and no `annotations` key), and the returned detail
    /// describes the change for the caller's audit record. `Ok(None)` means
    /// the request carried no annotation change; a `null` payload key is
    /// simply dropped from `params`.
    ///
    /// # Errors
    ///
    /// Any `AnnotationError`; `params` is left as it was.
    pub fn check_update_annotations(
        &self,
        study: &Study,
        entity: &EntityRef,
        params: &mut UpdateParams,
        options: &RequestOptions,
        reader: &dyn AnnotationSetReader,
        user: &UserIdentity,
    ) -> Result<Option<AnnotationChangeDetail>, AnnotationError> {
        let schemas = self.check_payload_schema.then_some(&self.schemas);
        let result = match AnnotationUpdate::decode(params, options, schemas) {
            Ok(AnnotationUpdate::Untouched) => Ok(None),
            Ok(AnnotationUpdate::ClearSets) => {
                params.remove(ANNOTATION_SETS);
                Ok(None)
            }
            Ok(AnnotationUpdate::ClearAnnotations) => {
                params.remove(ANNOTATIONS);
                Ok(None)
            }
            Ok(AnnotationUpdate::WholeSets { action, sets }) => self
                .update_whole_sets(study, entity, params, action, sets, reader, user)
                .map(Some),
            Ok(AnnotationUpdate::Fields { action, payload }) => self
                .update_fields(study, entity, params, action, payload, reader)
                .map(Some),
            Err(err) => Err(err),
        };

        result.inspect_err(|error| {
            warn!(
                %error,
                category = %error.category(),
                study = %study.fqn,
                entity = %entity.uid,
                "annotation update rejected"
            );
        })
    }

    /// Validate the annotation sets supplied when an entity is created.
    ///
    /// Sets are checked in order against the study's variable sets and each
    /// other; the accepted sets are returned normalised and timestamped.
    ///
    /// # Errors
    ///
    /// `NoVariableSets` when there is anything to validate but the study has
    /// no variable sets, plus every error of whole-set ADD.
    pub fn validate_new_annotation_sets(
        &self,
        study: &Study,
        entity: &EntityRef,
        sets: Vec<AnnotationSet>,
        user: &UserIdentity,
    ) -> Result<Vec<AnnotationSet>, AnnotationError> {
        if sets.is_empty() {
            return Ok(sets);
        }
        let catalog = VariableSetCatalog::new(study);
        catalog.require_non_empty()?;
        let mut gate = ConfidentialGate::new(self.permissions.as_ref(), &study.fqn, user);
        self.admit_new_sets(&catalog, entity.entity_type, Vec::new(), sets, &mut gate)
    }

    /// Normalise an annotation search query for `study`.
    ///
    /// With `user`, querying a confidential variable set requires the
    /// confidential access permission (checked once).
    ///
    /// # Errors
    ///
    /// See [`normalize_annotation_query`].
    pub fn normalize_annotation_query(
        &self,
        study: &Study,
        query: &str,
        user: Option<&UserIdentity>,
    ) -> Result<NormalizedQuery, AnnotationError> {
        match user {
            Some(user) => {
                let mut gate = ConfidentialGate::new(self.permissions.as_ref(), &study.fqn, user);
                normalize_annotation_query(study, query, Some(&mut gate))
            }
            None => normalize_annotation_query(study, query, None),
        }
    }

    // -----------------------------------------------------------------------
    // Whole annotation sets
    // -----------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn update_whole_sets(
        &self,
        study: &Study,
        entity: &EntityRef,
        params: &mut UpdateParams,
        action: SetAction,
        sets: Vec<AnnotationSet>,
        reader: &dyn AnnotationSetReader,
        user: &UserIdentity,
    ) -> Result<AnnotationChangeDetail, AnnotationError> {
        debug!(study = %study.fqn, entity = %entity.uid, %action, count = sets.len(), "updating annotation sets");

        if action == SetAction::Remove {
            for set in &sets {
                if set.id.trim().is_empty() {
                    return Err(AnnotationError::MissingParameter {
                        name: ANNOTATION_SET_ID.into(),
                    });
                }
            }
            return Ok(change_detail(AnnotationUpdateMode::AnnotationSets, action.as_str(), &sets));
        }

        let catalog = VariableSetCatalog::new(study);
        catalog.require_non_empty()?;

        let persisted = match action {
            SetAction::Add => reader.annotation_sets(&entity.uid, None)?,
            SetAction::Set | SetAction::Remove => Vec::new(),
        };

        let mut gate = ConfidentialGate::new(self.permissions.as_ref(), &study.fqn, user);
        let accepted = self.admit_new_sets(&catalog, entity.entity_type, persisted, sets, &mut gate)?;

        params.insert(ANNOTATION_SETS, sets_to_json(&accepted)?);
        Ok(change_detail(
            AnnotationUpdateMode::AnnotationSets,
            action.as_str(),
            &accepted,
        ))
    }

    fn admit_new_sets(
        &self,
        catalog: &VariableSetCatalog<'_>,
        entity_type: EntityType,
        persisted: Vec<AnnotationSet>,
        sets: Vec<AnnotationSet>,
        gate: &mut ConfidentialGate<'_>,
    ) -> Result<Vec<AnnotationSet>, AnnotationError> {
        let mut guard = BatchGuard::new(persisted);
        for mut set in sets {
            check_set_id(&set.id)?;
            guard.check(&set)?;
            let variable_set = catalog.find_variable_set(&set.variable_set_id)?;
            gate.admit(variable_set)?;
            set.annotations = self.validator.validate(
                variable_set,
                &set,
                Some(guard.known()),
                ValidationMode::NewSet,
                entity_type,
            )?;
            set.creation_date.get_or_insert_with(Utc::now);
            guard.admit(set)?;
        }
        Ok(guard.into_admitted())
    }

    // -----------------------------------------------------------------------
    // Field-level changes
    // -----------------------------------------------------------------------

    fn update_fields(
        &self,
        study: &Study,
        entity: &EntityRef,
        params: &mut UpdateParams,
        action: UpdateAction,
        payload: AnnotationSet,
        reader: &dyn AnnotationSetReader,
    ) -> Result<AnnotationChangeDetail, AnnotationError> {
        if payload.id.trim().is_empty() {
            return Err(AnnotationError::MissingParameter {
                name: ANNOTATION_SET_ID.into(),
            });
        }
        debug!(study = %study.fqn, entity = %entity.uid, annotation_set = %payload.id, %action, "updating annotations");

        let catalog = VariableSetCatalog::new(study);
        catalog.require_non_empty()?;

        let mut stored = reader.annotation_sets(&entity.uid, Some(&payload.id))?;
        let target = match stored.len() {
            0 => {
                return Err(AnnotationError::AnnotationSetNotFound {
                    id: payload.id.clone(),
                });
            }
            1 => stored.remove(0),
            count => return Err(AnnotationError::MultipleAnnotationSets { count }),
        };

        let variable_set = catalog.find_variable_set(&target.variable_set_id)?;
        let mut updated = engine::apply(action, &target, &payload.annotations, variable_set)?;
        updated.annotations = self.validator.validate(
            variable_set,
            &updated,
            None,
            ValidationMode::Existing,
            entity.entity_type,
        )?;

        let updated = [updated];
        let json = sets_to_json(&updated)?;
        params.remove(ANNOTATIONS);
        params.insert(ANNOTATION_SETS, json);
        Ok(change_detail(
            AnnotationUpdateMode::Annotations,
            action.as_str(),
            &updated,
        ))
    }
}

/// Annotation set ids must be non-empty and use only ASCII alphanumerics and
/// `_ - . +`.
fn check_set_id(id: &str) -> Result<(), AnnotationError> {
    if id.is_empty() {
        return Err(AnnotationError::MissingParameter {
            name: ANNOTATION_SET_ID.into(),
        });
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'))
    {
        return Err(AnnotationError::InvalidId {
            name: ANNOTATION_SET_ID.into(),
            value: id.to_string(),
        });
    }
    Ok(())
}

fn sets_to_json(sets: &[AnnotationSet]) -> Result<serde_json::Value, AnnotationError> {
    serde_json::to_value(sets).map_err(|e| AnnotationError::decode(ANNOTATION_SETS, &e))
}

fn change_detail(
    mode: AnnotationUpdateMode,
    action: &str,
    sets: &[AnnotationSet],
) -> AnnotationChangeDetail {
    let mut variable_set_ids: Vec<String> = Vec::new();
    for set in sets {
        if !set.variable_set_id.is_empty() && !variable_set_ids.contains(&set.variable_set_id) {
            variable_set_ids.push(set.variable_set_id.clone());
        }
    }
    AnnotationChangeDetail {
        mode,
        action: action.to_string(),
        annotation_set_ids: sets.iter().map(|s| s.id.clone()).collect(),
        variable_set_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_ids_follow_alias_rules() {
        check_set_id("baseline_2024-v1.0+x").unwrap();
        assert!(matches!(
            check_set_id(""),
            Err(AnnotationError::MissingParameter { .. })
        ));
        assert!(matches!(
            check_set_id("has space"),
            Err(AnnotationError::InvalidId { .. })
        ));
        assert!(matches!(
            check_set_id("ñ"),
            Err(AnnotationError::InvalidId { .. })
        ));
    }

    #[test]
    fn detail_deduplicates_variable_sets() {
        let sets = vec![
            AnnotationSet::new("a", "vs1", Default::default()),
            AnnotationSet::new("b", "vs2", Default::default()),
            AnnotationSet::new("c", "vs1", Default::default()),
        ];
        let detail = change_detail(AnnotationUpdateMode::AnnotationSets, "ADD", &sets);
        assert_eq!(detail.annotation_set_ids, vec!["a", "b", "c"]);
        assert_eq!(detail.variable_set_ids, vec!["vs1", "vs2"]);
    }
}
