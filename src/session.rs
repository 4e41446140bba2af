//! Session identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The (user, session) pair that partitions chat history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: String,
    pub session_id: String,
}

impl SessionContext {
    /// Issue a fresh pair of random identifiers.
    pub fn new() -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Resume an existing session.
    pub fn from_ids(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    /// Use the given ids where present and generate the rest.
    pub fn resolve(user_id: Option<String>, session_id: Option<String>) -> Self {
        Self {
            user_id: user_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            session_id: session_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sessions_are_unique() {
        let a = SessionContext::new();
        let b = SessionContext::new();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a.user_id).is_ok());
        assert!(Uuid::parse_str(&a.session_id).is_ok());
    }

    #[test]
    fn test_resolve_keeps_given_ids() {
        let session = SessionContext::resolve(Some("alice".to_string()), None);
        assert_eq!(session.user_id, "alice");
        assert!(Uuid::parse_str(&session.session_id).is_ok());

        let resumed = SessionContext::resolve(Some("alice".to_string()), Some("s1".to_string()));
        assert_eq!(resumed, SessionContext::from_ids("alice", "s1"));
        assert_eq!(resumed.to_string(), "alice/s1");
    }
}
