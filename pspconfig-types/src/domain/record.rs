//! Shared pieces of the versioned-record frame.

use serde::{Deserialize, Serialize};

/// Record status. Independent of versioning: every version carries its own
/// status, and only the latest version's status matters for business reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Enabled,
    Disabled,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Enabled => write!(f, "ENABLED"),
            Status::Disabled => write!(f, "DISABLED"),
        }
    }
}

/// A record identified by `(id, version)`.
///
/// Versions start at 1 and increment by exactly 1 per update; rows are
/// immutable once written. The generic store relies on this trait only for
/// identity, never for payload access.
pub trait Versioned {
    fn record_id(&self) -> &str;
    fn record_version(&self) -> i32;
}

/// Resolves the audit actor for a create or update, falling back to the
/// system user when the caller supplied none.
pub fn audit_actor(actor: Option<&str>) -> String {
    match actor {
        Some(a) if !a.trim().is_empty() => a.to_string(),
        _ => "system".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_actor_fallback() {
        assert_eq!(audit_actor(None), "system");
        assert_eq!(audit_actor(Some("")), "system");
        assert_eq!(audit_actor(Some("ops@example.com")), "ops@example.com");
    }
}
