//! Read-side currency facts: `currency_limits` and `flow_targets`.

use sqlx::{FromRow, SqliteConnection};

use pspconfig_types::{CurrencyLimit, FlowTarget, Scope, StoreError};

#[derive(FromRow)]
struct CurrencyLimitRow {
    brand_id: String,
    environment_id: String,
    flow_action_id: String,
    psp_id: String,
    currency: String,
    min_value: f64,
    max_value: f64,
}

#[derive(FromRow)]
struct FlowTargetRow {
    id: String,
    name: String,
    currencies: String,
}

pub(crate) async fn currency_supported(
    conn: &mut SqliteConnection,
    scope: &Scope,
    flow_action_id: &str,
    psp_id: &str,
    currency: &str,
) -> Result<bool, StoreError> {
    let count: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM currency_limits
           WHERE brand_id = ? AND environment_id = ? AND flow_action_id = ?
             AND psp_id = ? AND currency = ?"#,
    )
    .bind(&scope.brand_id)
    .bind(&scope.environment_id)
    .bind(flow_action_id)
    .bind(psp_id)
    .bind(currency)
    .fetch_one(conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(count > 0)
}

pub(crate) async fn supported_psp_ids(
    conn: &mut SqliteConnection,
    scope: &Scope,
    flow_action_id: &str,
    currency: &str,
) -> Result<Vec<String>, StoreError> {
    sqlx::query_scalar(
        r#"SELECT psp_id FROM currency_limits
           WHERE brand_id = ? AND environment_id = ? AND flow_action_id = ? AND currency = ?"#,
    )
    .bind(&scope.brand_id)
    .bind(&scope.environment_id)
    .bind(flow_action_id)
    .bind(currency)
    .fetch_all(conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))
}

pub(crate) async fn currency_limit(
    conn: &mut SqliteConnection,
    scope: &Scope,
    flow_action_id: &str,
    psp_id: &str,
    currency: &str,
) -> Result<Option<CurrencyLimit>, StoreError> {
    let row: Option<CurrencyLimitRow> = sqlx::query_as(
        r#"SELECT brand_id, environment_id, flow_action_id, psp_id, currency,
                  min_value, max_value
           FROM currency_limits
           WHERE brand_id = ? AND environment_id = ? AND flow_action_id = ?
             AND psp_id = ? AND currency = ?"#,
    )
    .bind(&scope.brand_id)
    .bind(&scope.environment_id)
    .bind(flow_action_id)
    .bind(psp_id)
    .bind(currency)
    .fetch_optional(conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(row.map(|row| CurrencyLimit {
        scope: Scope::new(row.brand_id, row.environment_id),
        flow_action_id: row.flow_action_id,
        psp_id: row.psp_id,
        currency: row.currency,
        min_value: row.min_value,
        max_value: row.max_value,
    }))
}

pub(crate) async fn find_flow_target(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<FlowTarget>, StoreError> {
    let row: Option<FlowTargetRow> =
        sqlx::query_as(r#"SELECT id, name, currencies FROM flow_targets WHERE id = ?"#)
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

    row.map(|row| {
        let currencies = serde_json::from_str(&row.currencies)
            .map_err(|e| StoreError::Database(format!("unreadable currencies column: {e}")))?;
        Ok(FlowTarget {
            id: row.id,
            name: row.name,
            currencies,
        })
    })
    .transpose()
}

pub(crate) async fn upsert_currency_limit(
    conn: &mut SqliteConnection,
    limit: &CurrencyLimit,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"INSERT INTO currency_limits
           (brand_id, environment_id, flow_action_id, psp_id, currency, min_value, max_value)
           VALUES (?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (brand_id, environment_id, flow_action_id, psp_id, currency)
           DO UPDATE SET min_value = excluded.min_value, max_value = excluded.max_value"#,
    )
    .bind(&limit.scope.brand_id)
    .bind(&limit.scope.environment_id)
    .bind(&limit.flow_action_id)
    .bind(&limit.psp_id)
    .bind(&limit.currency)
    .bind(limit.min_value)
    .bind(limit.max_value)
    .execute(conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(())
}

pub(crate) async fn upsert_flow_target(
    conn: &mut SqliteConnection,
    target: &FlowTarget,
) -> Result<(), StoreError> {
    let currencies = serde_json::to_string(&target.currencies)
        .map_err(|e| StoreError::Database(e.to_string()))?;

    sqlx::query(
        r#"INSERT INTO flow_targets (id, name, currencies) VALUES (?, ?, ?)
           ON CONFLICT (id) DO UPDATE SET name = excluded.name,
                                          currencies = excluded.currencies"#,
    )
    .bind(&target.id)
    .bind(&target.name)
    .bind(currencies)
    .execute(conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(())
}
