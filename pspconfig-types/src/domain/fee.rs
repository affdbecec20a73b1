//! Fee configuration records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{self, prefix};
use super::record::{Status, Versioned, audit_actor};
use super::scope::Scope;

/// Who the fee is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeFeeType {
    /// The fee is bundled into the amount the customer pays.
    Inclusive,
    /// The fee is charged on top, visible as a separate line.
    Exclusive,
}

impl std::fmt::Display for ChargeFeeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChargeFeeType::Inclusive => write!(f, "INCLUSIVE"),
            ChargeFeeType::Exclusive => write!(f, "EXCLUSIVE"),
        }
    }
}

/// How a single fee component is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeComponentType {
    Fixed,
    FixedPerUnit,
    Percentage,
}

impl std::fmt::Display for FeeComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeComponentType::Fixed => write!(f, "FIXED"),
            FeeComponentType::FixedPerUnit => write!(f, "FIXED_PER_UNIT"),
            FeeComponentType::Percentage => write!(f, "PERCENTAGE"),
        }
    }
}

/// One component of a fee. A fee version owns a fresh set of components;
/// they are never shared across versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeComponent {
    pub component_type: FeeComponentType,
    pub amount: f64,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

/// Child rows attached to one fee version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeChildren {
    pub components: Vec<FeeComponent>,
    pub countries: Vec<String>,
    pub psps: Vec<String>,
}

/// One immutable version of a fee configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeConfig {
    pub id: String,
    pub version: i32,
    pub name: String,
    pub currency: String,
    pub charge_fee_type: ChargeFeeType,
    pub scope: Scope,
    pub flow_action_id: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl FeeConfig {
    /// Builds version 1 of a new fee.
    pub fn create(
        name: impl Into<String>,
        currency: impl Into<String>,
        charge_fee_type: ChargeFeeType,
        scope: Scope,
        flow_action_id: impl Into<String>,
        created_by: Option<&str>,
    ) -> Self {
        let now = Utc::now();
        let actor = audit_actor(created_by);
        Self {
            id: id::generate(prefix::FEE),
            version: 1,
            name: name.into(),
            currency: currency.into(),
            charge_fee_type,
            scope,
            flow_action_id: flow_action_id.into(),
            status: Status::Enabled,
            created_at: now,
            created_by: actor.clone(),
            updated_at: now,
            updated_by: actor,
        }
    }

    /// Builds the next version of this fee. Identity, creation audit fields
    /// and scope carry over; everything else comes from the update.
    pub fn new_version(
        &self,
        name: impl Into<String>,
        currency: impl Into<String>,
        charge_fee_type: ChargeFeeType,
        flow_action_id: impl Into<String>,
        status: Status,
        updated_by: Option<&str>,
    ) -> Self {
        Self {
            id: self.id.clone(),
            version: self.version + 1,
            name: name.into(),
            currency: currency.into(),
            charge_fee_type,
            scope: self.scope.clone(),
            flow_action_id: flow_action_id.into(),
            status,
            created_at: self.created_at,
            created_by: self.created_by.clone(),
            updated_at: Utc::now(),
            updated_by: audit_actor(updated_by),
        }
    }
}

impl Versioned for FeeConfig {
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

    fn sample() -> FeeConfig {
        FeeConfig::create(
            "card processing",
            "EUR",
            ChargeFeeType::Exclusive,
            Scope::new("brn_1", "env_1"),
            "fat_1",
            Some("alice"),
        )
    }

    #[test]
    fn test_create_starts_at_version_one() {
        let fee = sample();
        assert_eq!(fee.version, 1);
        assert_eq!(fee.status, Status::Enabled);
        assert!(id::has_prefix(&fee.id, prefix::FEE));
        assert_eq!(fee.created_by, "alice");
        assert_eq!(fee.updated_by, "alice");
    }

    #[test]
    fn test_new_version_carries_identity_and_creation_audit() {
        let v1 = sample();
        let v2 = v1.new_version(
            "card processing v2",
            "USD",
            ChargeFeeType::Inclusive,
            "fat_2",
            Status::Disabled,
            None,
        );
        assert_eq!(v2.id, v1.id);
        assert_eq!(v2.version, 2);
        assert_eq!(v2.scope, v1.scope);
        assert_eq!(v2.created_at, v1.created_at);
        assert_eq!(v2.created_by, "alice");
        assert_eq!(v2.updated_by, "system");
        assert_eq!(v2.currency, "USD");
        assert_eq!(v2.status, Status::Disabled);
    }
}
