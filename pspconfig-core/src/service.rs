//! Configuration application service.
//!
//! Orchestrates the versioned record operations through the repository
//! port. Validation here fails fast with friendly errors; the invariants
//! that must hold under concurrency (duplicate pairs, routing defaults)
//! are re-checked inside the adapter's write transactions, which stay
//! authoritative.

use pspconfig_types::{
    ConfigError, ConfigRepository, ConversionRateConfig, ConversionRateDetails,
    ConversionRateUpdate, CurrencyLimit, DomainError, ErrorCode, FeeChildren, FeeConfig,
    FeeDetails, FeeUpdate, FlowTarget, NewConversionRate, NewFee, NewRiskRule, NewRoutingRule,
    OperationCurrencyRequest, RiskRule, RiskRuleDetails, RiskRuleUpdate, RoutingRule,
    RoutingRuleDetails, RoutingRuleUpdate, Scope, StoreError,
};

use crate::{currency, operation, validate};

/// Application service for PSP configuration management.
///
/// Generic over `R: ConfigRepository`; the adapter is injected at compile
/// time, which keeps the service testable against any port implementation.
pub struct ConfigService<R: ConfigRepository> {
    repo: R,
}

impl<R: ConfigRepository> ConfigService<R> {
    /// Creates a new service with the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Maps a store error, giving `NotFound` the kind-specific code.
    fn store_err(err: StoreError, not_found: ErrorCode, what: &str) -> ConfigError {
        match err {
            StoreError::NotFound => {
                ConfigError::not_found(not_found, format!("{what} not found"))
            }
            other => other.into(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Fees
    // ─────────────────────────────────────────────────────────────────────

    pub async fn create_fee(&self, req: NewFee) -> Result<FeeDetails, ConfigError> {
        validate::require("name", &req.name)?;
        validate::require("currency", &req.currency)?;
        validate::require("flow_action_id", &req.flow_action_id)?;
        validate::require("brand_id", &req.scope.brand_id)?;
        validate::require("environment_id", &req.scope.environment_id)?;

        let children = FeeChildren {
            components: req.components,
            countries: req.countries,
            psps: req.psps,
        };
        validate::fee_children(&children)?;

        if self
            .repo
            .find_fee_by_name(&req.scope, &req.flow_action_id, &req.name)
            .await?
            .is_some()
        {
            return Err(ConfigError::conflict(
                ErrorCode::FeeAlreadyExists,
                format!("a fee named {} already exists for this flow action", req.name),
            ));
        }

        currency::validate_all_supported(
            &self.repo,
            &req.scope,
            &req.flow_action_id,
            &req.currency,
            &children.psps,
        )
        .await?;

        let fee = FeeConfig::create(
            req.name,
            req.currency,
            req.charge_fee_type,
            req.scope,
            req.flow_action_id,
            req.created_by.as_deref(),
        );

        self.repo.insert_fee(&fee, &children).await?;

        tracing::info!(fee_id = %fee.id, scope = %fee.scope, "fee created");
        Ok(FeeDetails { fee, children })
    }

    /// Publishes a new fee version. The currency check runs against the
    /// existing record's currency, scope and flow action combined with the
    /// incoming PSP list.
    pub async fn update_fee(&self, id: &str, update: FeeUpdate) -> Result<FeeDetails, ConfigError> {
        validate::require("name", &update.name)?;
        validate::require("currency", &update.currency)?;
        validate::require("flow_action_id", &update.flow_action_id)?;
        validate::fee_children(&update.children)?;

        let existing = self
            .repo
            .find_latest_fee(id)
            .await?
            .ok_or_else(|| ConfigError::not_found(ErrorCode::FeeNotFound, "fee not found"))?;

        currency::validate_all_supported(
            &self.repo,
            &existing.scope,
            &existing.flow_action_id,
            &existing.currency,
            &update.children.psps,
        )
        .await?;

        let children = update.children.clone();
        let fee = self
            .repo
            .insert_fee_version(id, update)
            .await
            .map_err(|e| Self::store_err(e, ErrorCode::FeeNotFound, "fee"))?;

        tracing::info!(fee_id = %fee.id, version = fee.version, "fee version published");
        Ok(FeeDetails { fee, children })
    }

    pub async fn get_fee(&self, id: &str) -> Result<FeeDetails, ConfigError> {
        let fee = self
            .repo
            .find_latest_fee(id)
            .await?
            .ok_or_else(|| ConfigError::not_found(ErrorCode::FeeNotFound, "fee not found"))?;
        let children = self.repo.fee_children(&fee.id, fee.version).await?;
        Ok(FeeDetails { fee, children })
    }

    pub async fn list_fee_versions(&self, id: &str) -> Result<Vec<FeeConfig>, ConfigError> {
        let versions = self.repo.find_fee_versions(id).await?;
        if versions.is_empty() {
            return Err(ConfigError::not_found(ErrorCode::FeeNotFound, "fee not found"));
        }
        Ok(versions)
    }

    pub async fn list_fees(&self, scope: &Scope) -> Result<Vec<FeeConfig>, ConfigError> {
        Ok(self.repo.find_fees_by_scope(scope).await?)
    }

    pub async fn list_fees_by_psp(
        &self,
        scope: &Scope,
        psp_id: &str,
    ) -> Result<Vec<FeeConfig>, ConfigError> {
        Ok(self.repo.find_fees_by_psp(scope, psp_id).await?)
    }

    pub async fn delete_fee(&self, id: &str) -> Result<u64, ConfigError> {
        let removed = self
            .repo
            .delete_fee(id)
            .await
            .map_err(|e| Self::store_err(e, ErrorCode::FeeNotFound, "fee"))?;
        tracing::info!(fee_id = id, versions = removed, "fee deleted");
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Conversion rates
    // ─────────────────────────────────────────────────────────────────────

    pub async fn create_conversion_rate(
        &self,
        req: NewConversionRate,
    ) -> Result<ConversionRateDetails, ConfigError> {
        validate::require("brand_id", &req.scope.brand_id)?;
        validate::require("environment_id", &req.scope.environment_id)?;
        validate::markup(&req.markup)?;

        // Fail fast; the adapter re-checks inside the insert transaction.
        let duplicates = self
            .repo
            .count_active_currency_pairs(
                &req.scope,
                &req.markup.source_currency,
                &req.markup.target_currency,
                &req.markup.markup_option.to_string(),
                None,
            )
            .await?;
        if duplicates > 0 {
            return Err(DomainError::DuplicateCurrencyPair {
                source_currency: req.markup.source_currency.clone(),
                target_currency: req.markup.target_currency.clone(),
                markup_option: req.markup.markup_option.to_string(),
            }
            .into());
        }

        let config = ConversionRateConfig::create(
            req.source_type,
            req.fetch_option,
            req.scope,
            req.created_by.as_deref(),
        );

        self.repo
            .insert_conversion_rate(&config, &req.markup)
            .await?;

        tracing::info!(config_id = %config.id, scope = %config.scope, "conversion rate created");
        Ok(ConversionRateDetails {
            config,
            markup: req.markup,
        })
    }

    pub async fn update_conversion_rate(
        &self,
        id: &str,
        update: ConversionRateUpdate,
    ) -> Result<ConversionRateDetails, ConfigError> {
        validate::markup(&update.markup)?;

        let markup = update.markup.clone();
        let config = self
            .repo
            .insert_conversion_rate_version(id, update)
            .await
            .map_err(|e| Self::store_err(e, ErrorCode::ConversionRateNotFound, "conversion rate"))?;

        tracing::info!(
            config_id = %config.id,
            version = config.version,
            "conversion rate version published"
        );
        Ok(ConversionRateDetails { config, markup })
    }

    pub async fn get_conversion_rate(
        &self,
        id: &str,
    ) -> Result<ConversionRateDetails, ConfigError> {
        let config = self.repo.find_latest_conversion_rate(id).await?.ok_or_else(|| {
            ConfigError::not_found(ErrorCode::ConversionRateNotFound, "conversion rate not found")
        })?;
        let markup = self
            .repo
            .conversion_rate_markup(&config.id, config.version)
            .await?;
        Ok(ConversionRateDetails { config, markup })
    }

    pub async fn list_conversion_rate_versions(
        &self,
        id: &str,
    ) -> Result<Vec<ConversionRateConfig>, ConfigError> {
        let versions = self.repo.find_conversion_rate_versions(id).await?;
        if versions.is_empty() {
            return Err(ConfigError::not_found(
                ErrorCode::ConversionRateNotFound,
                "conversion rate not found",
            ));
        }
        Ok(versions)
    }

    pub async fn list_conversion_rates(
        &self,
        scope: &Scope,
    ) -> Result<Vec<ConversionRateConfig>, ConfigError> {
        Ok(self.repo.find_conversion_rates_by_scope(scope).await?)
    }

    pub async fn delete_conversion_rate(&self, id: &str) -> Result<u64, ConfigError> {
        let removed = self
            .repo
            .delete_conversion_rate(id)
            .await
            .map_err(|e| Self::store_err(e, ErrorCode::ConversionRateNotFound, "conversion rate"))?;
        tracing::info!(config_id = id, versions = removed, "conversion rate deleted");
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Risk rules
    // ─────────────────────────────────────────────────────────────────────

    pub async fn create_risk_rule(&self, req: NewRiskRule) -> Result<RiskRuleDetails, ConfigError> {
        validate::require("name", &req.name)?;
        validate::require("currency", &req.currency)?;
        validate::require("flow_action_id", &req.flow_action_id)?;
        validate::require("brand_id", &req.scope.brand_id)?;
        validate::require("environment_id", &req.scope.environment_id)?;
        validate::risk_amount(req.max_amount)?;
        validate::risk_criteria(
            req.rule_type,
            req.criteria_type.is_some(),
            req.criteria_value.as_deref(),
        )?;
        validate::psp_list(&req.psps)?;

        currency::validate_with_fallback(
            &self.repo,
            &req.scope,
            &req.flow_action_id,
            &req.currency,
            &req.psps,
        )
        .await?;

        let rule = RiskRule::create(
            req.name,
            req.rule_type,
            req.action,
            req.currency,
            req.duration,
            req.criteria_type,
            req.criteria_value,
            req.max_amount,
            req.scope,
            req.flow_action_id,
            req.created_by.as_deref(),
        );

        self.repo.insert_risk_rule(&rule, &req.psps).await?;

        tracing::info!(rule_id = %rule.id, scope = %rule.scope, "risk rule created");
        Ok(RiskRuleDetails {
            rule,
            psps: req.psps,
        })
    }

    pub async fn update_risk_rule(
        &self,
        id: &str,
        update: RiskRuleUpdate,
    ) -> Result<RiskRuleDetails, ConfigError> {
        validate::require("name", &update.name)?;
        validate::require("currency", &update.currency)?;
        validate::require("flow_action_id", &update.flow_action_id)?;
        validate::risk_amount(update.max_amount)?;
        validate::risk_criteria(
            update.rule_type,
            update.criteria_type.is_some(),
            update.criteria_value.as_deref(),
        )?;
        validate::psp_list(&update.psps)?;

        let existing = self.repo.find_latest_risk_rule(id).await?.ok_or_else(|| {
            ConfigError::not_found(ErrorCode::RiskRuleNotFound, "risk rule not found")
        })?;

        currency::validate_with_fallback(
            &self.repo,
            &existing.scope,
            &update.flow_action_id,
            &update.currency,
            &update.psps,
        )
        .await?;

        let psps = update.psps.clone();
        let rule = self
            .repo
            .insert_risk_rule_version(id, update)
            .await
            .map_err(|e| Self::store_err(e, ErrorCode::RiskRuleNotFound, "risk rule"))?;

        tracing::info!(rule_id = %rule.id, version = rule.version, "risk rule version published");
        Ok(RiskRuleDetails { rule, psps })
    }

    pub async fn get_risk_rule(&self, id: &str) -> Result<RiskRuleDetails, ConfigError> {
        let rule = self.repo.find_latest_risk_rule(id).await?.ok_or_else(|| {
            ConfigError::not_found(ErrorCode::RiskRuleNotFound, "risk rule not found")
        })?;
        let psps = self.repo.risk_rule_psps(&rule.id, rule.version).await?;
        Ok(RiskRuleDetails { rule, psps })
    }

    pub async fn list_risk_rule_versions(&self, id: &str) -> Result<Vec<RiskRule>, ConfigError> {
        let versions = self.repo.find_risk_rule_versions(id).await?;
        if versions.is_empty() {
            return Err(ConfigError::not_found(
                ErrorCode::RiskRuleNotFound,
                "risk rule not found",
            ));
        }
        Ok(versions)
    }

    pub async fn list_risk_rules(&self, scope: &Scope) -> Result<Vec<RiskRule>, ConfigError> {
        Ok(self.repo.find_risk_rules_by_scope(scope).await?)
    }

    pub async fn delete_risk_rule(&self, id: &str) -> Result<u64, ConfigError> {
        let removed = self
            .repo
            .delete_risk_rule(id)
            .await
            .map_err(|e| Self::store_err(e, ErrorCode::RiskRuleNotFound, "risk rule"))?;
        tracing::info!(rule_id = id, versions = removed, "risk rule deleted");
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Routing rules
    // ─────────────────────────────────────────────────────────────────────

    pub async fn create_routing_rule(
        &self,
        req: NewRoutingRule,
    ) -> Result<RoutingRuleDetails, ConfigError> {
        validate::require("name", &req.name)?;
        validate::require("brand_id", &req.scope.brand_id)?;
        validate::require("environment_id", &req.scope.environment_id)?;
        validate::routing_psps(&req.psps)?;

        let rule = RoutingRule::create(
            req.name,
            req.scope,
            req.psp_selection_mode,
            req.condition,
            req.is_default.unwrap_or(false),
            req.created_by.as_deref(),
        );

        // The adapter may promote the rule to default (first in scope).
        let rule = self.repo.insert_routing_rule(&rule, &req.psps).await?;

        tracing::info!(
            rule_id = %rule.id,
            scope = %rule.scope,
            is_default = rule.is_default,
            "routing rule created"
        );
        Ok(RoutingRuleDetails {
            rule,
            psps: req.psps,
        })
    }

    pub async fn update_routing_rule(
        &self,
        id: &str,
        update: RoutingRuleUpdate,
    ) -> Result<RoutingRuleDetails, ConfigError> {
        validate::require("name", &update.name)?;
        validate::routing_psps(&update.psps)?;

        let psps = update.psps.clone();
        let rule = self
            .repo
            .insert_routing_rule_version(id, update)
            .await
            .map_err(|e| Self::store_err(e, ErrorCode::RoutingRuleNotFound, "routing rule"))?;

        tracing::info!(
            rule_id = %rule.id,
            version = rule.version,
            "routing rule version published"
        );
        Ok(RoutingRuleDetails { rule, psps })
    }

    pub async fn get_routing_rule(&self, id: &str) -> Result<RoutingRuleDetails, ConfigError> {
        let rule = self.repo.find_latest_routing_rule(id).await?.ok_or_else(|| {
            ConfigError::not_found(ErrorCode::RoutingRuleNotFound, "routing rule not found")
        })?;
        let psps = self.repo.routing_rule_psps(&rule.id, rule.version).await?;
        Ok(RoutingRuleDetails { rule, psps })
    }

    pub async fn list_routing_rule_versions(
        &self,
        id: &str,
    ) -> Result<Vec<RoutingRule>, ConfigError> {
        let versions = self.repo.find_routing_rule_versions(id).await?;
        if versions.is_empty() {
            return Err(ConfigError::not_found(
                ErrorCode::RoutingRuleNotFound,
                "routing rule not found",
            ));
        }
        Ok(versions)
    }

    pub async fn list_routing_rules(&self, scope: &Scope) -> Result<Vec<RoutingRule>, ConfigError> {
        Ok(self.repo.find_routing_rules_by_scope(scope).await?)
    }

    /// Deletes a routing rule, subject to the default-rule and last-rule
    /// guards enforced in the adapter's delete transaction.
    pub async fn delete_routing_rule(&self, id: &str) -> Result<u64, ConfigError> {
        let removed = self
            .repo
            .delete_routing_rule(id)
            .await
            .map_err(|e| Self::store_err(e, ErrorCode::RoutingRuleNotFound, "routing rule"))?;
        tracing::info!(rule_id = id, versions = removed, "routing rule deleted");
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Operation currencies and seeding
    // ─────────────────────────────────────────────────────────────────────

    pub async fn validate_operation_currencies(
        &self,
        request: &OperationCurrencyRequest,
    ) -> Result<(), ConfigError> {
        operation::validate_operation_currencies(&self.repo, request).await?;
        Ok(())
    }

    pub async fn seed_currency_limit(&self, limit: &CurrencyLimit) -> Result<(), ConfigError> {
        Ok(self.repo.upsert_currency_limit(limit).await?)
    }

    pub async fn seed_flow_target(&self, target: &FlowTarget) -> Result<(), ConfigError> {
        Ok(self.repo.upsert_flow_target(target).await?)
    }
}
