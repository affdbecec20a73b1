//! Request payloads and detail views crossing the service boundary.

use serde::{Deserialize, Serialize};

use crate::domain::{
    ChargeFeeType, ConversionRateConfig, CustomerCriteriaType, FeeChildren, FeeComponent,
    FeeConfig, FetchOption, MarkupValue, PspSelectionMode, RateSource, RiskAction, RiskDuration,
    RiskRule, RiskType, RoutingPsp, RoutingRule, Scope, Status,
};

/// Payload to create a fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFee {
    pub name: String,
    pub currency: String,
    pub charge_fee_type: ChargeFeeType,
    pub scope: Scope,
    pub flow_action_id: String,
    pub components: Vec<FeeComponent>,
    #[serde(default)]
    pub countries: Vec<String>,
    pub psps: Vec<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Payload to publish a new version of an existing fee. Child rows are
/// always replaced wholesale; an empty list clears them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeUpdate {
    pub name: String,
    pub currency: String,
    pub charge_fee_type: ChargeFeeType,
    pub flow_action_id: String,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub updated_by: Option<String>,
    pub children: FeeChildren,
}

/// Payload to create a conversion-rate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewConversionRate {
    pub source_type: RateSource,
    pub fetch_option: FetchOption,
    pub scope: Scope,
    pub markup: MarkupValue,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Payload to publish a new version of a conversion-rate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRateUpdate {
    pub source_type: RateSource,
    pub fetch_option: FetchOption,
    pub markup: MarkupValue,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

/// Payload to create a risk rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRiskRule {
    pub name: String,
    pub rule_type: RiskType,
    pub action: RiskAction,
    pub currency: String,
    pub duration: RiskDuration,
    #[serde(default)]
    pub criteria_type: Option<CustomerCriteriaType>,
    #[serde(default)]
    pub criteria_value: Option<String>,
    pub max_amount: f64,
    pub scope: Scope,
    pub flow_action_id: String,
    pub psps: Vec<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Payload to publish a new version of a risk rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRuleUpdate {
    pub name: String,
    pub rule_type: RiskType,
    pub action: RiskAction,
    pub currency: String,
    pub duration: RiskDuration,
    #[serde(default)]
    pub criteria_type: Option<CustomerCriteriaType>,
    #[serde(default)]
    pub criteria_value: Option<String>,
    pub max_amount: f64,
    pub flow_action_id: String,
    pub psps: Vec<String>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

/// Payload to create a routing rule. When `is_default` is omitted the rule
/// is non-default unless it is the first rule in its scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoutingRule {
    pub name: String,
    pub scope: Scope,
    pub psp_selection_mode: PspSelectionMode,
    pub condition: serde_json::Value,
    #[serde(default)]
    pub is_default: Option<bool>,
    pub psps: Vec<RoutingPsp>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Payload to publish a new version of a routing rule. Omitted fields carry
/// over from the latest version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRuleUpdate {
    pub name: String,
    #[serde(default)]
    pub psp_selection_mode: Option<PspSelectionMode>,
    #[serde(default)]
    pub condition: Option<serde_json::Value>,
    #[serde(default)]
    pub is_default: Option<bool>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub updated_by: Option<String>,
    pub psps: Vec<RoutingPsp>,
}

/// A fee version with its child rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeDetails {
    #[serde(flatten)]
    pub fee: FeeConfig,
    pub children: FeeChildren,
}

/// A conversion-rate version with its markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRateDetails {
    #[serde(flatten)]
    pub config: ConversionRateConfig,
    pub markup: MarkupValue,
}

/// A risk rule version with its PSP list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRuleDetails {
    #[serde(flatten)]
    pub rule: RiskRule,
    pub psps: Vec<String>,
}

/// A routing rule version with its candidate PSPs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRuleDetails {
    #[serde(flatten)]
    pub rule: RoutingRule,
    pub psps: Vec<RoutingPsp>,
}

/// One currency a PSP wants enabled for a flow action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationCurrency {
    pub currency: String,
    pub min_value: f64,
    pub max_value: f64,
}

/// Currencies requested for one flow action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PspOperation {
    pub flow_action_id: String,
    pub currencies: Vec<OperationCurrency>,
}

/// Batch currency-validation request against a flow target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationCurrencyRequest {
    pub flow_target_id: String,
    pub operations: Vec<PspOperation>,
}
