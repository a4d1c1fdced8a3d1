//! In-memory collaborators for tests of code that drives the manager.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use annot_core::entities::AnnotationSet;
use annot_core::enums::StudyPermission;
use annot_core::errors::AnnotationError;
use annot_core::identity::UserIdentity;

use crate::ports::{AnnotationSetReader, PermissionChecker};

/// `AnnotationSetReader` backed by a map from entity uid to its sets.
#[derive(Debug, Default)]
pub struct InMemoryReader {
    sets: HashMap<String, Vec<AnnotationSet>>,
    fail_with: Option<String>,
}

impl InMemoryReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `sets` as the annotation sets of `entity_uid`.
    #[must_use]
    pub fn with_sets(mut self, entity_uid: &str, sets: Vec<AnnotationSet>) -> Self {
        self.sets.insert(entity_uid.to_string(), sets);
        self
    }

    /// Make every read fail with a collaborator error carrying `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            sets: HashMap::new(),
            fail_with: Some(message.to_string()),
        }
    }
}

impl AnnotationSetReader for InMemoryReader {
    fn annotation_sets(
        &self,
        entity_uid: &str,
        set_id: Option<&str>,
    ) -> Result<Vec<AnnotationSet>, AnnotationError> {
        if let Some(message) = &self.fail_with {
            return Err(anyhow::anyhow!("{message}").into());
        }
        let sets = self.sets.get(entity_uid).cloned().unwrap_or_default();
        Ok(match set_id {
            Some(id) => sets.into_iter().filter(|s| s.id == id).collect(),
            None => sets,
        })
    }
}

/// `PermissionChecker` that counts and records every check.
#[derive(Debug)]
pub struct RecordingPermissionChecker {
    allow: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String, StudyPermission)>>,
}

impl RecordingPermissionChecker {
    #[must_use]
    pub fn allowing() -> Self {
        Self::with_outcome(true)
    }

    #[must_use]
    pub fn denying() -> Self {
        Self::with_outcome(false)
    }

    fn with_outcome(allow: bool) -> Self {
        Self {
            allow,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Number of permission checks made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(study, user, permission)` of every check, in order.
    #[must_use]
    pub fn seen(&self) -> Vec<(String, String, StudyPermission)> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

impl PermissionChecker for RecordingPermissionChecker {
    fn check_study_permission(
        &self,
        study: &str,
        user: &UserIdentity,
        permission: StudyPermission,
    ) -> Result<(), AnnotationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((study.to_string(), user.user_id.clone(), permission));
        }
        if self.allow {
            Ok(())
        } else {
            Err(AnnotationError::PermissionDenied {
                study: study.to_string(),
                user: user.user_id.clone(),
                permission: permission.to_string(),
            })
        }
    }
}
