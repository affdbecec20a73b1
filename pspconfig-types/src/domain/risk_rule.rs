//! Risk rule records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{self, prefix};
use super::record::{Status, Versioned, audit_actor};
use super::scope::Scope;

/// What the rule limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskType {
    Default,
    Customer,
}

impl std::fmt::Display for RiskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskType::Default => write!(f, "DEFAULT"),
            RiskType::Customer => write!(f, "CUSTOMER"),
        }
    }
}

/// What happens when the rule trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskAction {
    Block,
    Alert,
}

impl std::fmt::Display for RiskAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskAction::Block => write!(f, "BLOCK"),
            RiskAction::Alert => write!(f, "ALERT"),
        }
    }
}

/// Window over which amounts are accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskDuration {
    Hour,
    Day,
    Week,
    Month,
}

impl std::fmt::Display for RiskDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskDuration::Hour => write!(f, "HOUR"),
            RiskDuration::Day => write!(f, "DAY"),
            RiskDuration::Week => write!(f, "WEEK"),
            RiskDuration::Month => write!(f, "MONTH"),
        }
    }
}

/// How customer-scoped rules select their customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerCriteriaType {
    Tag,
    AccountType,
}

impl std::fmt::Display for CustomerCriteriaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CustomerCriteriaType::Tag => write!(f, "TAG"),
            CustomerCriteriaType::AccountType => write!(f, "ACCOUNT_TYPE"),
        }
    }
}

/// One immutable version of a risk rule. Customer rules carry criteria;
/// default rules leave both criteria fields empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRule {
    pub id: String,
    pub version: i32,
    pub name: String,
    pub rule_type: RiskType,
    pub action: RiskAction,
    pub currency: String,
    pub duration: RiskDuration,
    pub criteria_type: Option<CustomerCriteriaType>,
    pub criteria_value: Option<String>,
    pub max_amount: f64,
    pub scope: Scope,
    pub flow_action_id: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl RiskRule {
    /// Builds version 1 of a new risk rule.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        name: impl Into<String>,
        rule_type: RiskType,
        action: RiskAction,
        currency: impl Into<String>,
        duration: RiskDuration,
        criteria_type: Option<CustomerCriteriaType>,
        criteria_value: Option<String>,
        max_amount: f64,
        scope: Scope,
        flow_action_id: impl Into<String>,
        created_by: Option<&str>,
    ) -> Self {
        let now = Utc::now();
        let actor = audit_actor(created_by);
        Self {
            id: id::generate(prefix::RISK_RULE),
            version: 1,
            name: name.into(),
            rule_type,
            action,
            currency: currency.into(),
            duration,
            criteria_type,
            criteria_value,
            max_amount,
            scope,
            flow_action_id: flow_action_id.into(),
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
        rule_type: RiskType,
        action: RiskAction,
        currency: impl Into<String>,
        duration: RiskDuration,
        criteria_type: Option<CustomerCriteriaType>,
        criteria_value: Option<String>,
        max_amount: f64,
        flow_action_id: impl Into<String>,
        status: Status,
        updated_by: Option<&str>,
    ) -> Self {
        Self {
            id: self.id.clone(),
            version: self.version + 1,
            name: name.into(),
            rule_type,
            action,
            currency: currency.into(),
            duration,
            criteria_type,
            criteria_value,
            max_amount,
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

impl Versioned for RiskRule {
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

    #[test]
    fn test_create_and_new_version() {
        let v1 = RiskRule::create(
            "daily cap",
            RiskType::Default,
            RiskAction::Block,
            "EUR",
            RiskDuration::Day,
            None,
            None,
            5_000.0,
            Scope::new("brn_1", "env_1"),
            "fat_1",
            Some("carol"),
        );
        assert_eq!(v1.version, 1);
        assert!(id::has_prefix(&v1.id, prefix::RISK_RULE));

        let v2 = v1.new_version(
            "daily cap",
            RiskType::Customer,
            RiskAction::Alert,
            "EUR",
            RiskDuration::Week,
            Some(CustomerCriteriaType::Tag),
            Some("vip".to_string()),
            10_000.0,
            "fat_1",
            Status::Enabled,
            Some("carol"),
        );
        assert_eq!(v2.version, 2);
        assert_eq!(v2.id, v1.id);
        assert_eq!(v2.created_by, "carol");
        assert_eq!(v2.criteria_value.as_deref(), Some("vip"));
    }
}
