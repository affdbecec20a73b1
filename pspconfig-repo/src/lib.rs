//! # PSP Configuration Repository
//!
//! SQLite adapter implementing the `ConfigRepository` port. The append-only
//! versioning lifecycle lives in a generic engine (`store`); the four record
//! kinds plug in their table SQL (`tables`); read-side currency facts are in
//! `lookups`.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Sqlite, SqlitePool};

use pspconfig_types::{
    ConfigRepository, ConversionRateConfig, ConversionRateUpdate, CurrencyLimit, FeeChildren,
    FeeConfig, FeeUpdate, FlowTarget, MarkupValue, RiskRule, RiskRuleUpdate, RoutingPsp,
    RoutingRule, RoutingRuleUpdate, Scope, StoreError,
};

mod lookups;
mod parse;
mod store;
mod tables;

#[cfg(test)]
mod sqlite_tests;

use store::ScopedStore;
use tables::conversion_rate::ConversionRateKind;
use tables::fee::FeeKind;
use tables::risk_rule::RiskRuleKind;
use tables::routing_rule::RoutingRuleKind;

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

/// Build and initialize a repository from a database URL.
///
/// Connects, runs migrations, returns a ready-to-use repo.
pub async fn build_repo(database_url: &str) -> anyhow::Result<SqliteRepo> {
    SqliteRepo::new(database_url).await
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::raw_sql(ddl).execute(&pool).await?;

        tracing::info!("database schema ready");
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn fees(&self) -> ScopedStore<FeeKind> {
        ScopedStore::new(self.pool.clone())
    }

    fn conversion_rates(&self) -> ScopedStore<ConversionRateKind> {
        ScopedStore::new(self.pool.clone())
    }

    fn risk_rules(&self) -> ScopedStore<RiskRuleKind> {
        ScopedStore::new(self.pool.clone())
    }

    fn routing_rules(&self) -> ScopedStore<RoutingRuleKind> {
        ScopedStore::new(self.pool.clone())
    }

    async fn conn(&self) -> Result<PoolConnection<Sqlite>, StoreError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

#[async_trait]
impl ConfigRepository for SqliteRepo {
    // Fees

    async fn insert_fee(
        &self,
        fee: &FeeConfig,
        children: &FeeChildren,
    ) -> Result<(), StoreError> {
        self.fees().create(fee.clone(), children).await?;
        Ok(())
    }

    async fn insert_fee_version(
        &self,
        id: &str,
        update: FeeUpdate,
    ) -> Result<FeeConfig, StoreError> {
        self.fees().create_new_version(id, update).await
    }

    async fn find_latest_fee(&self, id: &str) -> Result<Option<FeeConfig>, StoreError> {
        self.fees().find_latest(id).await
    }

    async fn find_fee_versions(&self, id: &str) -> Result<Vec<FeeConfig>, StoreError> {
        self.fees().find_all_versions(id).await
    }

    async fn find_fees_by_scope(&self, scope: &Scope) -> Result<Vec<FeeConfig>, StoreError> {
        self.fees().find_by_scope(scope).await
    }

    async fn find_fees_by_psp(
        &self,
        scope: &Scope,
        psp_id: &str,
    ) -> Result<Vec<FeeConfig>, StoreError> {
        let mut conn = self.conn().await?;
        tables::fee::find_by_psp(&mut conn, scope, psp_id).await
    }

    async fn find_fee_by_name(
        &self,
        scope: &Scope,
        flow_action_id: &str,
        name: &str,
    ) -> Result<Option<FeeConfig>, StoreError> {
        let mut conn = self.conn().await?;
        tables::fee::find_by_name(&mut conn, scope, flow_action_id, name).await
    }

    async fn fee_children(&self, id: &str, version: i32) -> Result<FeeChildren, StoreError> {
        let mut conn = self.conn().await?;
        tables::fee::fetch_children(&mut conn, id, version).await
    }

    async fn delete_fee(&self, id: &str) -> Result<u64, StoreError> {
        self.fees().delete_all(id).await
    }

    // Conversion rates

    async fn insert_conversion_rate(
        &self,
        config: &ConversionRateConfig,
        markup: &MarkupValue,
    ) -> Result<(), StoreError> {
        self.conversion_rates().create(config.clone(), markup).await?;
        Ok(())
    }

    async fn insert_conversion_rate_version(
        &self,
        id: &str,
        update: ConversionRateUpdate,
    ) -> Result<ConversionRateConfig, StoreError> {
        self.conversion_rates().create_new_version(id, update).await
    }

    async fn find_latest_conversion_rate(
        &self,
        id: &str,
    ) -> Result<Option<ConversionRateConfig>, StoreError> {
        self.conversion_rates().find_latest(id).await
    }

    async fn find_conversion_rate_versions(
        &self,
        id: &str,
    ) -> Result<Vec<ConversionRateConfig>, StoreError> {
        self.conversion_rates().find_all_versions(id).await
    }

    async fn find_conversion_rates_by_scope(
        &self,
        scope: &Scope,
    ) -> Result<Vec<ConversionRateConfig>, StoreError> {
        self.conversion_rates().find_by_scope(scope).await
    }

    async fn conversion_rate_markup(
        &self,
        id: &str,
        version: i32,
    ) -> Result<MarkupValue, StoreError> {
        let mut conn = self.conn().await?;
        tables::conversion_rate::fetch_markup(&mut conn, id, version).await
    }

    async fn count_active_currency_pairs(
        &self,
        scope: &Scope,
        source_currency: &str,
        target_currency: &str,
        markup_option: &str,
        exclude_id: Option<&str>,
    ) -> Result<i64, StoreError> {
        let mut conn = self.conn().await?;
        tables::conversion_rate::count_active_pairs(
            &mut conn,
            scope,
            source_currency,
            target_currency,
            markup_option,
            exclude_id,
        )
        .await
    }

    async fn delete_conversion_rate(&self, id: &str) -> Result<u64, StoreError> {
        self.conversion_rates().delete_all(id).await
    }

    // Risk rules

    async fn insert_risk_rule(&self, rule: &RiskRule, psps: &[String]) -> Result<(), StoreError> {
        self.risk_rules().create(rule.clone(), &psps.to_vec()).await?;
        Ok(())
    }

    async fn insert_risk_rule_version(
        &self,
        id: &str,
        update: RiskRuleUpdate,
    ) -> Result<RiskRule, StoreError> {
        self.risk_rules().create_new_version(id, update).await
    }

    async fn find_latest_risk_rule(&self, id: &str) -> Result<Option<RiskRule>, StoreError> {
        self.risk_rules().find_latest(id).await
    }

    async fn find_risk_rule_versions(&self, id: &str) -> Result<Vec<RiskRule>, StoreError> {
        self.risk_rules().find_all_versions(id).await
    }

    async fn find_risk_rules_by_scope(&self, scope: &Scope) -> Result<Vec<RiskRule>, StoreError> {
        self.risk_rules().find_by_scope(scope).await
    }

    async fn risk_rule_psps(&self, id: &str, version: i32) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn().await?;
        tables::risk_rule::fetch_psps(&mut conn, id, version).await
    }

    async fn delete_risk_rule(&self, id: &str) -> Result<u64, StoreError> {
        self.risk_rules().delete_all(id).await
    }

    // Routing rules

    async fn insert_routing_rule(
        &self,
        rule: &RoutingRule,
        psps: &[RoutingPsp],
    ) -> Result<RoutingRule, StoreError> {
        self.routing_rules().create(rule.clone(), &psps.to_vec()).await
    }

    async fn insert_routing_rule_version(
        &self,
        id: &str,
        update: RoutingRuleUpdate,
    ) -> Result<RoutingRule, StoreError> {
        self.routing_rules().create_new_version(id, update).await
    }

    async fn find_latest_routing_rule(
        &self,
        id: &str,
    ) -> Result<Option<RoutingRule>, StoreError> {
        self.routing_rules().find_latest(id).await
    }

    async fn find_routing_rule_versions(&self, id: &str) -> Result<Vec<RoutingRule>, StoreError> {
        self.routing_rules().find_all_versions(id).await
    }

    async fn find_routing_rules_by_scope(
        &self,
        scope: &Scope,
    ) -> Result<Vec<RoutingRule>, StoreError> {
        self.routing_rules().find_by_scope(scope).await
    }

    async fn routing_rule_psps(
        &self,
        id: &str,
        version: i32,
    ) -> Result<Vec<RoutingPsp>, StoreError> {
        let mut conn = self.conn().await?;
        tables::routing_rule::fetch_psps(&mut conn, id, version).await
    }

    async fn count_routing_rules(&self, scope: &Scope) -> Result<i64, StoreError> {
        let mut conn = self.conn().await?;
        tables::routing_rule::count_in_scope(&mut conn, scope).await
    }

    async fn delete_routing_rule(&self, id: &str) -> Result<u64, StoreError> {
        self.routing_rules().delete_all(id).await
    }

    // Currency facts

    async fn currency_supported(
        &self,
        scope: &Scope,
        flow_action_id: &str,
        psp_id: &str,
        currency: &str,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        lookups::currency_supported(&mut conn, scope, flow_action_id, psp_id, currency).await
    }

    async fn supported_psp_ids(
        &self,
        scope: &Scope,
        flow_action_id: &str,
        currency: &str,
    ) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn().await?;
        lookups::supported_psp_ids(&mut conn, scope, flow_action_id, currency).await
    }

    async fn currency_limit(
        &self,
        scope: &Scope,
        flow_action_id: &str,
        psp_id: &str,
        currency: &str,
    ) -> Result<Option<CurrencyLimit>, StoreError> {
        let mut conn = self.conn().await?;
        lookups::currency_limit(&mut conn, scope, flow_action_id, psp_id, currency).await
    }

    async fn find_flow_target(&self, id: &str) -> Result<Option<FlowTarget>, StoreError> {
        let mut conn = self.conn().await?;
        lookups::find_flow_target(&mut conn, id).await
    }

    async fn upsert_currency_limit(&self, limit: &CurrencyLimit) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        lookups::upsert_currency_limit(&mut conn, limit).await
    }

    async fn upsert_flow_target(&self, target: &FlowTarget) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        lookups::upsert_flow_target(&mut conn, target).await
    }
}
