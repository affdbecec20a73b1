//! Routing rule records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{self, prefix};
use super::record::{Status, Versioned, audit_actor};
use super::scope::Scope;

/// How a matching rule picks among its candidate PSPs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PspSelectionMode {
    Priority,
    Random,
    Weighted,
}

impl std::fmt::Display for PspSelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PspSelectionMode::Priority => write!(f, "PRIORITY"),
            PspSelectionMode::Random => write!(f, "RANDOM"),
            PspSelectionMode::Weighted => write!(f, "WEIGHTED"),
        }
    }
}

/// A candidate PSP attached to one routing rule version. `psp_value` is the
/// priority rank or weight depending on the rule's selection mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPsp {
    pub psp_id: String,
    pub psp_value: Option<i64>,
}

/// One immutable version of a routing rule. The matching condition is an
/// opaque JSON document; the store never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub id: String,
    pub version: i32,
    pub name: String,
    pub scope: Scope,
    pub psp_selection_mode: PspSelectionMode,
    pub condition: serde_json::Value,
    pub is_default: bool,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl RoutingRule {
    /// Builds version 1 of a new routing rule.
    pub fn create(
        name: impl Into<String>,
        scope: Scope,
        psp_selection_mode: PspSelectionMode,
        condition: serde_json::Value,
        is_default: bool,
        created_by: Option<&str>,
    ) -> Self {
        let now = Utc::now();
        let actor = audit_actor(created_by);
        Self {
            id: id::generate(prefix::ROUTING_RULE),
            version: 1,
            name: name.into(),
            scope,
            psp_selection_mode,
            condition,
            is_default,
            status: Status::Enabled,
            created_at: now,
            created_by: actor.clone(),
            updated_at: now,
            updated_by: actor,
        }
    }

    /// Builds the next version of this rule.
    #[allow(clippy::too_many_arguments)]
    pub fn new_version(
        &self,
        name: impl Into<String>,
        psp_selection_mode: PspSelectionMode,
        condition: serde_json::Value,
        is_default: bool,
        status: Status,
        updated_by: Option<&str>,
    ) -> Self {
        Self {
            id: self.id.clone(),
            version: self.version + 1,
            name: name.into(),
            scope: self.scope.clone(),
            psp_selection_mode,
            condition,
            is_default,
            status,
            created_at: self.created_at,
            created_by: self.created_by.clone(),
            updated_at: Utc::now(),
            updated_by: audit_actor(updated_by),
        }
    }
}

impl Versioned for RoutingRule {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn record_version(&self) -> i32 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_version_preserves_identity() {
        let v1 = RoutingRule::create(
            "eu cards",
            Scope::new("brn_1", "env_1"),
            PspSelectionMode::Priority,
            json!({"country": "DE"}),
            true,
            None,
        );
        let v2 = v1.new_version(
            "eu cards",
            PspSelectionMode::Weighted,
            json!({"country": "DE", "method": "card"}),
            false,
            Status::Enabled,
            Some("dave"),
        );
        assert_eq!(v2.id, v1.id);
        assert_eq!(v2.version, 2);
        assert!(!v2.is_default);
        assert_eq!(v2.created_by, "system");
        assert_eq!(v2.updated_by, "dave");
    }
}
