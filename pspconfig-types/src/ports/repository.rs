//! Repository port for the configuration store.

use async_trait::async_trait;

use crate::domain::{
    ConversionRateConfig, CurrencyLimit, FeeChildren, FeeConfig, FlowTarget, MarkupValue,
    RiskRule, RoutingPsp, RoutingRule, Scope,
};
use crate::dto::{ConversionRateUpdate, FeeUpdate, RiskRuleUpdate, RoutingRuleUpdate};
use crate::error::StoreError;

/// Persistence port for versioned configuration records and the read-side
/// currency facts.
///
/// Contract, uniform across record kinds:
/// - records are append-only; a mutation writes a new `(id, version)` row
///   and never touches existing rows
/// - `insert_*_version` reads the latest version and writes latest+1 inside
///   one transaction, so concurrent updates serialize instead of colliding
/// - child rows belong to exactly one version and are written in the same
///   transaction as their parent
/// - `find_latest_*` returns the highest version; `find_*_by_scope` returns
///   the latest version of every record in the scope
/// - `delete_*` removes every version and all child rows, returning the
///   number of parent rows removed; deleting an unknown id yields
///   [`StoreError::NotFound`]
///
/// Kind-specific invariants (duplicate currency pairs, routing defaults)
/// are enforced inside the adapter's transaction, not left to callers.
#[async_trait]
pub trait ConfigRepository: Send + Sync + 'static {
    // Fees

    async fn insert_fee(&self, fee: &FeeConfig, children: &FeeChildren)
    -> Result<(), StoreError>;

    async fn insert_fee_version(
        &self,
        id: &str,
        update: FeeUpdate,
    ) -> Result<FeeConfig, StoreError>;

    async fn find_latest_fee(&self, id: &str) -> Result<Option<FeeConfig>, StoreError>;

    async fn find_fee_versions(&self, id: &str) -> Result<Vec<FeeConfig>, StoreError>;

    async fn find_fees_by_scope(&self, scope: &Scope) -> Result<Vec<FeeConfig>, StoreError>;

    async fn find_fees_by_psp(
        &self,
        scope: &Scope,
        psp_id: &str,
    ) -> Result<Vec<FeeConfig>, StoreError>;

    /// Latest fee version in scope carrying this name for the flow action,
    /// if any. Used for the name-conflict guard.
    async fn find_fee_by_name(
        &self,
        scope: &Scope,
        flow_action_id: &str,
        name: &str,
    ) -> Result<Option<FeeConfig>, StoreError>;

    async fn fee_children(&self, id: &str, version: i32) -> Result<FeeChildren, StoreError>;

    async fn delete_fee(&self, id: &str) -> Result<u64, StoreError>;

    // Conversion rates

    /// Inserts version 1, failing with
    /// [`DomainError::DuplicateCurrencyPair`](crate::error::DomainError::DuplicateCurrencyPair)
    /// if an enabled configuration for the same pair and markup option
    /// already exists in the scope. The check and the insert share one
    /// transaction.
    async fn insert_conversion_rate(
        &self,
        config: &ConversionRateConfig,
        markup: &MarkupValue,
    ) -> Result<(), StoreError>;

    /// Publishes the next version, with the same duplicate-pair guard,
    /// excluding this record id from the check.
    async fn insert_conversion_rate_version(
        &self,
        id: &str,
        update: ConversionRateUpdate,
    ) -> Result<ConversionRateConfig, StoreError>;

    async fn find_latest_conversion_rate(
        &self,
        id: &str,
    ) -> Result<Option<ConversionRateConfig>, StoreError>;

    async fn find_conversion_rate_versions(
        &self,
        id: &str,
    ) -> Result<Vec<ConversionRateConfig>, StoreError>;

    async fn find_conversion_rates_by_scope(
        &self,
        scope: &Scope,
    ) -> Result<Vec<ConversionRateConfig>, StoreError>;

    async fn conversion_rate_markup(
        &self,
        id: &str,
        version: i32,
    ) -> Result<MarkupValue, StoreError>;

    /// Enabled latest-version configurations in scope for this currency
    /// pair and markup option, optionally excluding one record id.
    async fn count_active_currency_pairs(
        &self,
        scope: &Scope,
        source_currency: &str,
        target_currency: &str,
        markup_option: &str,
        exclude_id: Option<&str>,
    ) -> Result<i64, StoreError>;

    async fn delete_conversion_rate(&self, id: &str) -> Result<u64, StoreError>;

    // Risk rules

    async fn insert_risk_rule(&self, rule: &RiskRule, psps: &[String]) -> Result<(), StoreError>;

    async fn insert_risk_rule_version(
        &self,
        id: &str,
        update: RiskRuleUpdate,
    ) -> Result<RiskRule, StoreError>;

    async fn find_latest_risk_rule(&self, id: &str) -> Result<Option<RiskRule>, StoreError>;

    async fn find_risk_rule_versions(&self, id: &str) -> Result<Vec<RiskRule>, StoreError>;

    async fn find_risk_rules_by_scope(&self, scope: &Scope) -> Result<Vec<RiskRule>, StoreError>;

    async fn risk_rule_psps(&self, id: &str, version: i32) -> Result<Vec<String>, StoreError>;

    async fn delete_risk_rule(&self, id: &str) -> Result<u64, StoreError>;

    // Routing rules

    /// Inserts version 1. The first rule in a scope is forced to be the
    /// default; a rule created as default demotes the previous default.
    /// Count, demotion and insert share one transaction.
    async fn insert_routing_rule(
        &self,
        rule: &RoutingRule,
        psps: &[RoutingPsp],
    ) -> Result<RoutingRule, StoreError>;

    /// Publishes the next version, demoting other defaults in the scope
    /// when this version is default.
    async fn insert_routing_rule_version(
        &self,
        id: &str,
        update: RoutingRuleUpdate,
    ) -> Result<RoutingRule, StoreError>;

    async fn find_latest_routing_rule(&self, id: &str)
    -> Result<Option<RoutingRule>, StoreError>;

    async fn find_routing_rule_versions(&self, id: &str) -> Result<Vec<RoutingRule>, StoreError>;

    async fn find_routing_rules_by_scope(
        &self,
        scope: &Scope,
    ) -> Result<Vec<RoutingRule>, StoreError>;

    async fn routing_rule_psps(&self, id: &str, version: i32)
    -> Result<Vec<RoutingPsp>, StoreError>;

    /// Distinct routing rules in a scope, counting ids not versions.
    async fn count_routing_rules(&self, scope: &Scope) -> Result<i64, StoreError>;

    /// Deletes all versions, refusing to remove the default rule while
    /// others exist or the last rule in its scope. Guards and delete share
    /// one transaction.
    async fn delete_routing_rule(&self, id: &str) -> Result<u64, StoreError>;

    // Currency facts

    /// True when the PSP supports the currency for the flow action in scope.
    async fn currency_supported(
        &self,
        scope: &Scope,
        flow_action_id: &str,
        psp_id: &str,
        currency: &str,
    ) -> Result<bool, StoreError>;

    /// PSP ids with any currency support for the flow action in scope.
    async fn supported_psp_ids(
        &self,
        scope: &Scope,
        flow_action_id: &str,
        currency: &str,
    ) -> Result<Vec<String>, StoreError>;

    async fn currency_limit(
        &self,
        scope: &Scope,
        flow_action_id: &str,
        psp_id: &str,
        currency: &str,
    ) -> Result<Option<CurrencyLimit>, StoreError>;

    async fn find_flow_target(&self, id: &str) -> Result<Option<FlowTarget>, StoreError>;

    async fn upsert_currency_limit(&self, limit: &CurrencyLimit) -> Result<(), StoreError>;

    async fn upsert_flow_target(&self, target: &FlowTarget) -> Result<(), StoreError>;
}
