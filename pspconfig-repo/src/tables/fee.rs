//! Fee tables: `fees` plus the per-version `fee_components`,
//! `fee_countries` and `fee_psps` child tables.

use async_trait::async_trait;
use sqlx::{FromRow, SqliteConnection};

use pspconfig_types::{FeeChildren, FeeComponent, FeeConfig, FeeUpdate, Scope, StoreError};

use crate::parse;
use crate::store::RecordKind;

#[derive(FromRow)]
pub(crate) struct FeeRow {
    pub id: String,
    pub version: i32,
    pub name: String,
    pub currency: String,
    pub charge_fee_type: String,
    pub brand_id: String,
    pub environment_id: String,
    pub flow_action_id: String,
    pub status: String,
    pub created_at: String,
    pub created_by: String,
    pub updated_at: String,
    pub updated_by: String,
}

impl FeeRow {
    pub(crate) fn into_domain(self) -> Result<FeeConfig, StoreError> {
        Ok(FeeConfig {
            id: self.id,
            version: self.version,
            name: self.name,
            currency: self.currency,
            charge_fee_type: parse::charge_fee_type(&self.charge_fee_type)?,
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

#[derive(FromRow)]
struct ComponentRow {
    component_type: String,
    amount: f64,
    min_value: Option<f64>,
    max_value: Option<f64>,
}

pub(crate) struct FeeKind;

#[async_trait]
impl RecordKind for FeeKind {
    type Record = FeeConfig;
    type Children = FeeChildren;
    type Update = FeeUpdate;

    const KIND: &'static str = "fee";

    fn next_version(latest: &FeeConfig, update: FeeUpdate) -> (FeeConfig, FeeChildren) {
        let record = latest.new_version(
            update.name,
            update.currency,
            update.charge_fee_type,
            update.flow_action_id,
            update.status.unwrap_or(latest.status),
            update.updated_by.as_deref(),
        );
        (record, update.children)
    }

    async fn insert_parent(
        conn: &mut SqliteConnection,
        record: &FeeConfig,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO fees
               (id, version, name, currency, charge_fee_type, brand_id, environment_id,
                flow_action_id, status, created_at, created_by, updated_at, updated_by)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&record.id)
        .bind(record.version)
        .bind(&record.name)
        .bind(&record.currency)
        .bind(record.charge_fee_type.to_string())
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
        children: &FeeChildren,
    ) -> Result<(), StoreError> {
        for component in &children.components {
            sqlx::query(
                r#"INSERT INTO fee_components
                   (fee_id, fee_version, component_type, amount, min_value, max_value)
                   VALUES (?, ?, ?, ?, ?, ?)"#,
            )
            .bind(id)
            .bind(version)
            .bind(component.component_type.to_string())
            .bind(component.amount)
            .bind(component.min_value)
            .bind(component.max_value)
            .execute(&mut *conn)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        }

        for country in &children.countries {
            sqlx::query(
                r#"INSERT INTO fee_countries (fee_id, fee_version, country) VALUES (?, ?, ?)"#,
            )
            .bind(id)
            .bind(version)
            .bind(country)
            .execute(&mut *conn)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        }

        for psp_id in &children.psps {
            sqlx::query(r#"INSERT INTO fee_psps (fee_id, fee_version, psp_id) VALUES (?, ?, ?)"#)
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
    ) -> Result<Option<FeeConfig>, StoreError> {
        let row: Option<FeeRow> = sqlx::query_as(
            r#"SELECT id, version, name, currency, charge_fee_type, brand_id, environment_id,
                      flow_action_id, status, created_at, created_by, updated_at, updated_by
               FROM fees WHERE id = ? ORDER BY version DESC LIMIT 1"#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        row.map(FeeRow::into_domain).transpose()
    }

    async fn fetch_versions(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<Vec<FeeConfig>, StoreError> {
        let rows: Vec<FeeRow> = sqlx::query_as(
            r#"SELECT id, version, name, currency, charge_fee_type, brand_id, environment_id,
                      flow_action_id, status, created_at, created_by, updated_at, updated_by
               FROM fees WHERE id = ? ORDER BY version DESC"#,
        )
        .bind(id)
        .fetch_all(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(FeeRow::into_domain).collect()
    }

    async fn fetch_by_scope(
        conn: &mut SqliteConnection,
        scope: &Scope,
    ) -> Result<Vec<FeeConfig>, StoreError> {
        let rows: Vec<FeeRow> = sqlx::query_as(
            r#"SELECT f.id, f.version, f.name, f.currency, f.charge_fee_type, f.brand_id,
                      f.environment_id, f.flow_action_id, f.status, f.created_at, f.created_by,
                      f.updated_at, f.updated_by
               FROM fees f
               JOIN (SELECT id, MAX(version) AS version FROM fees
                     WHERE brand_id = ? AND environment_id = ? GROUP BY id) latest
                 ON latest.id = f.id AND latest.version = f.version
               ORDER BY f.created_at DESC"#,
        )
        .bind(&scope.brand_id)
        .bind(&scope.environment_id)
        .fetch_all(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(FeeRow::into_domain).collect()
    }

    async fn delete_parents(conn: &mut SqliteConnection, id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(r#"DELETE FROM fees WHERE id = ?"#)
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn delete_children(conn: &mut SqliteConnection, id: &str) -> Result<(), StoreError> {
        for table in ["fee_components", "fee_countries", "fee_psps"] {
            let sql = format!("DELETE FROM {table} WHERE fee_id = ?");
            sqlx::query(&sql)
                .bind(id)
                .execute(&mut *conn)
                .await
                .map_err(|e| StoreError::Database(e.to_string()))?;
        }

        Ok(())
    }
}

/// Child rows for one `(id, version)`.
pub(crate) async fn fetch_children(
    conn: &mut SqliteConnection,
    id: &str,
    version: i32,
) -> Result<FeeChildren, StoreError> {
    let component_rows: Vec<ComponentRow> = sqlx::query_as(
        r#"SELECT component_type, amount, min_value, max_value
           FROM fee_components WHERE fee_id = ? AND fee_version = ?"#,
    )
    .bind(id)
    .bind(version)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    let components = component_rows
        .into_iter()
        .map(|row| {
            Ok(FeeComponent {
                component_type: parse::component_type(&row.component_type)?,
                amount: row.amount,
                min_value: row.min_value,
                max_value: row.max_value,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    let countries: Vec<String> = sqlx::query_scalar(
        r#"SELECT country FROM fee_countries WHERE fee_id = ? AND fee_version = ?"#,
    )
    .bind(id)
    .bind(version)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    let psps: Vec<String> =
        sqlx::query_scalar(r#"SELECT psp_id FROM fee_psps WHERE fee_id = ? AND fee_version = ?"#)
            .bind(id)
            .bind(version)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(FeeChildren {
        components,
        countries,
        psps,
    })
}

/// Latest fee version in scope carrying this name for the flow action.
pub(crate) async fn find_by_name(
    conn: &mut SqliteConnection,
    scope: &Scope,
    flow_action_id: &str,
    name: &str,
) -> Result<Option<FeeConfig>, StoreError> {
    let row: Option<FeeRow> = sqlx::query_as(
        r#"SELECT f.id, f.version, f.name, f.currency, f.charge_fee_type, f.brand_id,
                  f.environment_id, f.flow_action_id, f.status, f.created_at, f.created_by,
                  f.updated_at, f.updated_by
           FROM fees f
           JOIN (SELECT id, MAX(version) AS version FROM fees
                 WHERE brand_id = ? AND environment_id = ? GROUP BY id) latest
             ON latest.id = f.id AND latest.version = f.version
           WHERE f.flow_action_id = ? AND f.name = ?
           LIMIT 1"#,
    )
    .bind(&scope.brand_id)
    .bind(&scope.environment_id)
    .bind(flow_action_id)
    .bind(name)
    .fetch_optional(conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    row.map(FeeRow::into_domain).transpose()
}

/// Every fee version in scope linked to the PSP, newest first per fee.
pub(crate) async fn find_by_psp(
    conn: &mut SqliteConnection,
    scope: &Scope,
    psp_id: &str,
) -> Result<Vec<FeeConfig>, StoreError> {
    let rows: Vec<FeeRow> = sqlx::query_as(
        r#"SELECT f.id, f.version, f.name, f.currency, f.charge_fee_type, f.brand_id,
                  f.environment_id, f.flow_action_id, f.status, f.created_at, f.created_by,
                  f.updated_at, f.updated_by
           FROM fees f
           JOIN fee_psps p ON p.fee_id = f.id AND p.fee_version = f.version
           WHERE f.brand_id = ? AND f.environment_id = ? AND p.psp_id = ?
           ORDER BY f.id, f.version DESC"#,
    )
    .bind(&scope.brand_id)
    .bind(&scope.environment_id)
    .bind(psp_id)
    .fetch_all(conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    rows.into_iter().map(FeeRow::into_domain).collect()
}
