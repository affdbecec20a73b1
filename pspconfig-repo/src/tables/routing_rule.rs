//! Routing rule tables: `routing_rules` plus the per-version
//! `routing_rule_psps` child table.
//!
//! Scope invariants live here, inside the write transactions:
//! - the first rule in a scope is always the default;
//! - writing a default rule demotes every other rule's latest version
//!   (flag flip only, no new versions);
//! - the default rule cannot be deleted while other rules exist, and the
//!   last rule in a scope cannot be deleted at all.

use async_trait::async_trait;
use sqlx::{FromRow, SqliteConnection};

use pspconfig_types::{
    DomainError, RoutingPsp, RoutingRule, RoutingRuleUpdate, Scope, StoreError,
};

use crate::parse;
use crate::store::RecordKind;

#[derive(FromRow)]
pub(crate) struct RoutingRuleRow {
    pub id: String,
    pub version: i32,
    pub name: String,
    pub brand_id: String,
    pub environment_id: String,
    pub psp_selection_mode: String,
    pub condition_json: String,
    pub is_default: bool,
    pub status: String,
    pub created_at: String,
    pub created_by: String,
    pub updated_at: String,
    pub updated_by: String,
}

impl RoutingRuleRow {
    pub(crate) fn into_domain(self) -> Result<RoutingRule, StoreError> {
        let condition = serde_json::from_str(&self.condition_json)
            .map_err(|e| StoreError::Database(format!("unreadable condition column: {e}")))?;

        Ok(RoutingRule {
            id: self.id,
            version: self.version,
            name: self.name,
            scope: Scope::new(self.brand_id, self.environment_id),
            psp_selection_mode: parse::selection_mode(&self.psp_selection_mode)?,
            condition,
            is_default: self.is_default,
            status: parse::status(&self.status)?,
            created_at: parse::timestamp(&self.created_at)?,
            created_by: self.created_by,
            updated_at: parse::timestamp(&self.updated_at)?,
            updated_by: self.updated_by,
        })
    }
}

#[derive(FromRow)]
struct RoutingPspRow {
    psp_id: String,
    psp_value: Option<i64>,
}

pub(crate) struct RoutingRuleKind;

#[async_trait]
impl RecordKind for RoutingRuleKind {
    type Record = RoutingRule;
    type Children = Vec<RoutingPsp>;
    type Update = RoutingRuleUpdate;

    const KIND: &'static str = "routing_rule";

    fn next_version(
        latest: &RoutingRule,
        update: RoutingRuleUpdate,
    ) -> (RoutingRule, Vec<RoutingPsp>) {
        let record = latest.new_version(
            update.name,
            update.psp_selection_mode.unwrap_or(latest.psp_selection_mode),
            update.condition.unwrap_or_else(|| latest.condition.clone()),
            update.is_default.unwrap_or(latest.is_default),
            update.status.unwrap_or(latest.status),
            update.updated_by.as_deref(),
        );
        (record, update.psps)
    }

    async fn insert_parent(
        conn: &mut SqliteConnection,
        record: &RoutingRule,
    ) -> Result<(), StoreError> {
        let condition_json = serde_json::to_string(&record.condition)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO routing_rules
               (id, version, name, brand_id, environment_id, psp_selection_mode,
                condition_json, is_default, status, created_at, created_by, updated_at,
                updated_by)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&record.id)
        .bind(record.version)
        .bind(&record.name)
        .bind(&record.scope.brand_id)
        .bind(&record.scope.environment_id)
        .bind(record.psp_selection_mode.to_string())
        .bind(condition_json)
        .bind(record.is_default)
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
        psps: &Vec<RoutingPsp>,
    ) -> Result<(), StoreError> {
        for psp in psps {
            sqlx::query(
                r#"INSERT INTO routing_rule_psps (rule_id, rule_version, psp_id, psp_value)
                   VALUES (?, ?, ?, ?)"#,
            )
            .bind(id)
            .bind(version)
            .bind(&psp.psp_id)
            .bind(psp.psp_value)
            .execute(&mut *conn)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        }

        Ok(())
    }

    async fn fetch_latest(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<Option<RoutingRule>, StoreError> {
        let row: Option<RoutingRuleRow> = sqlx::query_as(
            r#"SELECT id, version, name, brand_id, environment_id, psp_selection_mode,
                      condition_json, is_default, status, created_at, created_by, updated_at,
                      updated_by
               FROM routing_rules WHERE id = ? ORDER BY version DESC LIMIT 1"#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        row.map(RoutingRuleRow::into_domain).transpose()
    }

    async fn fetch_versions(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<Vec<RoutingRule>, StoreError> {
        let rows: Vec<RoutingRuleRow> = sqlx::query_as(
            r#"SELECT id, version, name, brand_id, environment_id, psp_selection_mode,
                      condition_json, is_default, status, created_at, created_by, updated_at,
                      updated_by
               FROM routing_rules WHERE id = ? ORDER BY version DESC"#,
        )
        .bind(id)
        .fetch_all(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(RoutingRuleRow::into_domain).collect()
    }

    async fn fetch_by_scope(
        conn: &mut SqliteConnection,
        scope: &Scope,
    ) -> Result<Vec<RoutingRule>, StoreError> {
        let rows: Vec<RoutingRuleRow> = sqlx::query_as(
            r#"SELECT r.id, r.version, r.name, r.brand_id, r.environment_id,
                      r.psp_selection_mode, r.condition_json, r.is_default, r.status,
                      r.created_at, r.created_by, r.updated_at, r.updated_by
               FROM routing_rules r
               JOIN (SELECT id, MAX(version) AS version FROM routing_rules
                     WHERE brand_id = ? AND environment_id = ? GROUP BY id) latest
                 ON latest.id = r.id AND latest.version = r.version
               ORDER BY r.created_at DESC"#,
        )
        .bind(&scope.brand_id)
        .bind(&scope.environment_id)
        .fetch_all(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(RoutingRuleRow::into_domain).collect()
    }

    async fn delete_parents(conn: &mut SqliteConnection, id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(r#"DELETE FROM routing_rules WHERE id = ?"#)
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn delete_children(conn: &mut SqliteConnection, id: &str) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM routing_rule_psps WHERE rule_id = ?"#)
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn before_insert(
        conn: &mut SqliteConnection,
        record: &mut RoutingRule,
        _psps: &Vec<RoutingPsp>,
    ) -> Result<(), StoreError> {
        let others = count_in_scope_excluding(conn, &record.scope, &record.id).await?;

        if others == 0 {
            record.is_default = true;
        }

        if record.is_default {
            demote_others(conn, &record.scope, &record.id).await?;
        }

        Ok(())
    }

    async fn before_delete(conn: &mut SqliteConnection, id: &str) -> Result<(), StoreError> {
        let Some(latest) = Self::fetch_latest(conn, id).await? else {
            // Nothing to guard; the engine reports NotFound.
            return Ok(());
        };

        let others = count_in_scope_excluding(conn, &latest.scope, id).await?;

        if others == 0 {
            return Err(StoreError::Domain(DomainError::LastRuleDeleteForbidden));
        }
        if latest.is_default {
            return Err(StoreError::Domain(DomainError::DefaultRuleDeleteForbidden));
        }

        Ok(())
    }
}

/// Distinct routing rules in the scope.
pub(crate) async fn count_in_scope(
    conn: &mut SqliteConnection,
    scope: &Scope,
) -> Result<i64, StoreError> {
    sqlx::query_scalar(
        r#"SELECT COUNT(DISTINCT id) FROM routing_rules
           WHERE brand_id = ? AND environment_id = ?"#,
    )
    .bind(&scope.brand_id)
    .bind(&scope.environment_id)
    .fetch_one(conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))
}

async fn count_in_scope_excluding(
    conn: &mut SqliteConnection,
    scope: &Scope,
    exclude_id: &str,
) -> Result<i64, StoreError> {
    sqlx::query_scalar(
        r#"SELECT COUNT(DISTINCT id) FROM routing_rules
           WHERE brand_id = ? AND environment_id = ? AND id <> ?"#,
    )
    .bind(&scope.brand_id)
    .bind(&scope.environment_id)
    .bind(exclude_id)
    .fetch_one(conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))
}

/// Flips `is_default` off on the latest version of every other rule in the
/// scope. Older versions keep their historical flag.
async fn demote_others(
    conn: &mut SqliteConnection,
    scope: &Scope,
    keep_id: &str,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"UPDATE routing_rules SET is_default = 0
           WHERE brand_id = ? AND environment_id = ? AND id <> ? AND is_default = 1
             AND version = (SELECT MAX(version) FROM routing_rules r2
                            WHERE r2.id = routing_rules.id)"#,
    )
    .bind(&scope.brand_id)
    .bind(&scope.environment_id)
    .bind(keep_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    if result.rows_affected() > 0 {
        tracing::debug!(
            scope = %scope,
            demoted = result.rows_affected(),
            "previous default routing rule demoted"
        );
    }

    Ok(())
}

/// Candidate PSPs for one `(id, version)`.
pub(crate) async fn fetch_psps(
    conn: &mut SqliteConnection,
    id: &str,
    version: i32,
) -> Result<Vec<RoutingPsp>, StoreError> {
    let rows: Vec<RoutingPspRow> = sqlx::query_as(
        r#"SELECT psp_id, psp_value FROM routing_rule_psps
           WHERE rule_id = ? AND rule_version = ?"#,
    )
    .bind(id)
    .bind(version)
    .fetch_all(conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(rows
        .into_iter()
        .map(|row| RoutingPsp {
            psp_id: row.psp_id,
            psp_value: row.psp_value,
        })
        .collect())
}
