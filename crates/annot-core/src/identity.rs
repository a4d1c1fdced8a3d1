use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lightweight authenticated user identity for cross-crate passing.
///
/// Produced by the session layer of the surrounding system and consumed by the
/// annotation manager when it asks the authorization collaborator for study
/// permissions. Contains only data fields, no auth logic.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct UserIdentity {
    /// User id as resolved from the session token.
    pub user_id: String,
    /// Organization the user is acting in. `None` = default organization.
    pub organization: Option<String>,
}

impl UserIdentity {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            organization: None,
        }
    }
}
