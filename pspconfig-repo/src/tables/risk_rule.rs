//! Risk rule tables: `risk_rules` plus the per-version `risk_rule_psps`
//! child table.

use async_trait::async_trait;
use sqlx::{FromRow, SqliteConnection};

use pspconfig_types::{RiskRule, RiskRuleUpdate, Scope, StoreError};

use crate::parse;
use crate::store::RecordKind;

#[derive(FromRow)]
pub(crate) struct RiskRuleRow {
    pub id: String,
    pub version: i32,
    pub name: String,
    pub rule_type: String,
    pub action: String,
    pub currency: String,
    pub duration: String,
    pub criteria_type: Option<String>,
    pub criteria_value: Option<String>,
    pub max_amount: f64,
    pub brand_id: String,
    pub environment_id: String,
    pub flow_action_id: String,
    pub status: String,
    pub created_at: String,
    pub created_by: String,
    pub updated_at: String,
    pub updated_by: String,
}

impl RiskRuleRow {
    pub(crate) fn into_domain(self) -> Result<RiskRule, StoreError> {
        let criteria_type = self
            .criteria_type
            .as_deref()
            .map(parse::criteria_type)
            .transpose()?;

        Ok(RiskRule {
            id: self.id,
            version: self.version,
            name: self.name,
            rule_type: parse::risk_type(&self.rule_type)?,
            action: parse::risk_action(&self.action)?,
            currency: self.currency,
            duration: parse::risk_duration(&self.duration)?,
            criteria_type,
            criteria_value: self.criteria_value,
            max_amount: self.max_amount,
            scope: Scope::new(self.brand_id, self.environment_id),
            flow_action_id: self.flow_action_id,
            status: parse::status(&self.status)?,
            created_at: parse::timestamp(&self.created_at)?,
            created_by: self.created_by,
            updated_at: parse::timestamp(&self.updated_at)?,
            updated_by: self.updated_by,
        })
    }
}

pub(crate) struct RiskRuleKind;

#[async_trait]
impl RecordKind for RiskRuleKind {
    type Record = RiskRule;
    type Children = Vec<String>;
    type Update = RiskRuleUpdate;

    const KIND: &'static str = "risk_rule";

    fn next_version(latest: &RiskRule, update: RiskRuleUpdate) -> (RiskRule, Vec<String>) {
        let record = latest.new_version(
            update.name,
            update.rule_type,
            update.action,
            update.currency,
            update.duration,
            update.criteria_type,
            update.criteria_value,
            update.max_amount,
            update.flow_action_id,
            update.status.unwrap_or(latest.status),
            update.updated_by.as_deref(),
        );
        (record, update.psps)
    }

    async fn insert_parent(
        conn: &mut SqliteConnection,
        record: &RiskRule,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO risk_rules
               (id, version, name, rule_type, action, currency, duration, criteria_type,
                criteria_value, max_amount, brand_id, environment_id, flow_action_id, status,
                created_at, created_by, updated_at, updated_by)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&record.id)
        .bind(record.version)
        .bind(&record.name)
        .bind(record.rule_type.to_string())
        .bind(record.action.to_string())
        .bind(&record.currency)
        .bind(record.duration.to_string())
        .bind(record.criteria_type.map(|c| c.to_string()))
        .bind(&record.criteria_value)
        .bind(record.max_amount)
        .bind(&record.scope.brand_id)
        .bind(&record.scope.environment_id)
        .bind(&record.flow_action_id)
        .bind(record.status.to_string())
        .bind(record.created_at.to_rfc3339())
        .bind(&record.created_by)
        .bind(record.updated_at.to_rfc3339())
        .bind(&record.updated_by)
        .execute(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn insert_children(
        conn: &mut SqliteConnection,
        id: &str,
        version: i32,
        psps: &Vec<String>,
    ) -> Result<(), StoreError> {
        for psp_id in psps {
            sqlx::query(
                r#"INSERT INTO risk_rule_psps (rule_id, rule_version, psp_id) VALUES (?, ?, ?)"#,
            )
            .bind(id)
            .bind(version)
            .bind(psp_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        }

        Ok(())
    }

    async fn fetch_latest(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<Option<RiskRule>, StoreError> {
        let row: Option<RiskRuleRow> = sqlx::query_as(
            r#"SELECT id, version, name, rule_type, action, currency, duration, criteria_type,
                      criteria_value, max_amount, brand_id, environment_id, flow_action_id,
                      status, created_at, created_by, updated_at, updated_by
               FROM risk_rules WHERE id = ? ORDER BY version DESC LIMIT 1"#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        row.map(RiskRuleRow::into_domain).transpose()
    }

    async fn fetch_versions(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<Vec<RiskRule>, StoreError> {
        let rows: Vec<RiskRuleRow> = sqlx::query_as(
            r#"SELECT id, version, name, rule_type, action, currency, duration, criteria_type,
                      criteria_value, max_amount, brand_id, environment_id, flow_action_id,
                      status, created_at, created_by, updated_at, updated_by
               FROM risk_rules WHERE id = ? ORDER BY version DESC"#,
        )
        .bind(id)
        .fetch_all(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(RiskRuleRow::into_domain).collect()
    }

    async fn fetch_by_scope(
        conn: &mut SqliteConnection,
        scope: &Scope,
    ) -> Result<Vec<RiskRule>, StoreError> {
        let rows: Vec<RiskRuleRow> = sqlx::query_as(
            r#"SELECT r.id, r.version, r.name, r.rule_type, r.action, r.currency, r.duration,
                      r.criteria_type, r.criteria_value, r.max_amount, r.brand_id,
                      r.environment_id, r.flow_action_id, r.status, r.created_at, r.created_by,
                      r.updated_at, r.updated_by
               FROM risk_rules r
               JOIN (SELECT id, MAX(version) AS version FROM risk_rules
                     WHERE brand_id = ? AND environment_id = ? GROUP BY id) latest
                 ON latest.id = r.id AND latest.version = r.version
               ORDER BY r.created_at DESC"#,
        )
        .bind(&scope.brand_id)
        .bind(&scope.environment_id)
        .fetch_all(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(RiskRuleRow::into_domain).collect()
    }

    async fn delete_parents(conn: &mut SqliteConnection, id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(r#"DELETE FROM risk_rules WHERE id = ?"#)
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn delete_children(conn: &mut SqliteConnection, id: &str) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM risk_rule_psps WHERE rule_id = ?"#)
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

/// PSP links for one `(id, version)`.
pub(crate) async fn fetch_psps(
    conn: &mut SqliteConnection,
    id: &str,
    version: i32,
) -> Result<Vec<String>, StoreError> {
    sqlx::query_scalar(
        r#"SELECT psp_id FROM risk_rule_psps WHERE rule_id = ? AND rule_version = ?"#,
    )
    .bind(id)
    .bind(version)
    .fetch_all(conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))
}
