//! Confidential variable set access, checked at most once per call.

use tracing::debug;

use annot_core::entities::VariableSet;
use annot_core::enums::StudyPermission;
use annot_core::errors::AnnotationError;
use annot_core::identity::UserIdentity;

use crate::ports::PermissionChecker;

/// Per-call cache of the `CONFIDENTIAL_VARIABLE_SET_ACCESS` check.
///
/// The first confidential variable set seen triggers one permission check;
/// after it succeeds, later confidential sets pass without asking again. A
/// denial is returned as-is and aborts the call.
pub struct ConfidentialGate<'a> {
    checker: &'a dyn PermissionChecker,
    study: &'a str,
    user: &'a UserIdentity,
    granted: bool,
}

impl<'a> ConfidentialGate<'a> {
    #[must_use]
    pub fn new(checker: &'a dyn PermissionChecker, study: &'a str, user: &'a UserIdentity) -> Self {
        Self {
            checker,
            study,
            user,
            granted: false,
        }
    }

    /// Let `variable_set` through, checking the permission if it is
    /// confidential and not checked yet.
    ///
    /// # Errors
    ///
    /// Propagates the checker's error, usually `PermissionDenied`.
    pub fn admit(&mut self, variable_set: &VariableSet) -> Result<(), AnnotationError> {
        if !variable_set.confidential || self.granted {
            return Ok(());
        }
        self.checker.check_study_permission(
            self.study,
            self.user,
            StudyPermission::ConfidentialVariableSetAccess,
        )?;
        debug!(
            study = self.study,
            user = %self.user.user_id,
            variable_set = %variable_set.id,
            "confidential variable set access granted"
        );
        self.granted = true;
        Ok(())
    }

    #[must_use]
    pub const fn granted(&self) -> bool {
        self.granted
    }
}
