//! Actor identity threaded into every state-machine call.
//!
//! The identity collaborator (session layer, out of scope here)
//! resolves the caller once per request; everything downstream
//! receives an explicit [`ActorContext`] instead of reading
//! session globals.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GreffeError, GreffeResult};

/// A normalized role label.
///
/// Construction trims and lowercases, so case-insensitive matching
/// lives only at the boundary; internal comparisons are plain value
/// equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoleName {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<RoleName> for String {
    fn from(role: RoleName) -> Self {
        role.0
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub role: RoleName,
}

impl ActorContext {
    pub fn new(user_id: Uuid, role: RoleName) -> Self {
        Self { user_id, role }
    }

    /// Resolve the current actor from whatever identity the session
    /// collaborator produced. A missing or blank identity is always
    /// `Unauthorized`, never a silent default.
    pub fn resolve(identity: Option<(Uuid, &str)>) -> GreffeResult<Self> {
        match identity {
            Some((user_id, role)) if !role.trim().is_empty() => {
                Ok(Self::new(user_id, RoleName::new(role)))
            }
            Some(_) => Err(GreffeError::Unauthorized {
                reason: "session has no role".into(),
            }),
            None => Err(GreffeError::Unauthorized {
                reason: "not signed in".into(),
            }),
        }
    }
}
