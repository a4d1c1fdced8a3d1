//! Collaborator interfaces.
//!
//! The annotation subsystem reads persisted annotation sets and asks for
//! study permissions, but implements neither. Callers plug in their
//! persistence adaptor and authorization manager through these traits.

use annot_core::entities::AnnotationSet;
use annot_core::enums::StudyPermission;
use annot_core::errors::AnnotationError;
use annot_core::identity::UserIdentity;

/// Read access to the annotation sets an entity already owns.
pub trait AnnotationSetReader: Send + Sync {
    /// Annotation sets of the entity with internal id `entity_uid`.
    ///
    /// With `set_id`, returns at most the one set with that id; otherwise all
    /// sets of the entity in stored order.
    ///
    /// # Errors
    ///
    /// Persistence failures are reported as `AnnotationError::Collaborator`.
    fn annotation_sets(
        &self,
        entity_uid: &str,
        set_id: Option<&str>,
    ) -> Result<Vec<AnnotationSet>, AnnotationError>;
}

/// Study-level authorization.
pub trait PermissionChecker: Send + Sync {
    /// Succeed if `user` holds `permission` in `study`.
    ///
    /// # Errors
    ///
    /// Returns `AnnotationError::PermissionDenied` on denial.
    fn check_study_permission(
        &self,
        study: &str,
        user: &UserIdentity,
        permission: StudyPermission,
    ) -> Result<(), AnnotationError>;
}
