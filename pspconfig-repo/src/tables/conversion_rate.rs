//! Conversion-rate tables: `conversion_rate_configs` plus the one-per-version
//! `conversion_rate_markups` child table.
//!
//! The duplicate-pair invariant is enforced here, inside the insert
//! transaction: at most one ENABLED configuration per
//! `(scope, source_currency, target_currency, markup_option)`. Every write
//! is checked against the enabled holders of the pair, whatever status the
//! incoming version carries; only disabling the holder itself frees a pair.

use async_trait::async_trait;
use sqlx::{FromRow, SqliteConnection};

use pspconfig_types::{
    ConversionRateConfig, ConversionRateUpdate, DomainError, MarkupValue, Scope, StoreError,
};

use crate::parse;
use crate::store::RecordKind;

#[derive(FromRow)]
pub(crate) struct ConversionRateRow {
    pub id: String,
    pub version: i32,
    pub source_type: String,
    pub fetch_option: String,
    pub brand_id: String,
    pub environment_id: String,
    pub status: String,
    pub created_at: String,
    pub created_by: String,
    pub updated_at: String,
    pub updated_by: String,
}

impl ConversionRateRow {
    pub(crate) fn into_domain(self) -> Result<ConversionRateConfig, StoreError> {
        Ok(ConversionRateConfig {
            id: self.id,
            version: self.version,
            source_type: parse::rate_source(&self.source_type)?,
            fetch_option: parse::fetch_option(&self.fetch_option)?,
            scope: Scope::new(self.brand_id, self.environment_id),
            status: parse::status(&self.status)?,
            created_at: parse::timestamp(&self.created_at)?,
            created_by: self.created_by,
            updated_at: parse::timestamp(&self.updated_at)?,
            updated_by: self.updated_by,
        })
    }
}

#[derive(FromRow)]
struct MarkupRow {
    markup_option: String,
    source_currency: String,
    target_currency: String,
    amount: f64,
}

pub(crate) struct ConversionRateKind;

#[async_trait]
impl RecordKind for ConversionRateKind {
    type Record = ConversionRateConfig;
    type Children = MarkupValue;
    type Update = ConversionRateUpdate;

    const KIND: &'static str = "conversion_rate";

    fn next_version(
        latest: &ConversionRateConfig,
        update: ConversionRateUpdate,
    ) -> (ConversionRateConfig, MarkupValue) {
        let record = latest.new_version(
            update.source_type,
            update.fetch_option,
            update.status.unwrap_or(latest.status),
            update.updated_by.as_deref(),
        );
        (record, update.markup)
    }

    async fn insert_parent(
        conn: &mut SqliteConnection,
        record: &ConversionRateConfig,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO conversion_rate_configs
               (id, version, source_type, fetch_option, brand_id, environment_id,
                status, created_at, created_by, updated_at, updated_by)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&record.id)
        .bind(record.version)
        .bind(record.source_type.to_string())
        .bind(record.fetch_option.to_string())
        .bind(&record.scope.brand_id)
        .bind(&record.scope.environment_id)
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
        markup: &MarkupValue,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO conversion_rate_markups
               (config_id, config_version, markup_option, source_currency, target_currency, amount)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(id)
        .bind(version)
        .bind(markup.markup_option.to_string())
        .bind(&markup.source_currency)
        .bind(&markup.target_currency)
        .bind(markup.amount)
        .execute(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn fetch_latest(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<Option<ConversionRateConfig>, StoreError> {
        let row: Option<ConversionRateRow> = sqlx::query_as(
            r#"SELECT id, version, source_type, fetch_option, brand_id, environment_id,
                      status, created_at, created_by, updated_at, updated_by
               FROM conversion_rate_configs WHERE id = ? ORDER BY version DESC LIMIT 1"#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        row.map(ConversionRateRow::into_domain).transpose()
    }

    async fn fetch_versions(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<Vec<ConversionRateConfig>, StoreError> {
        let rows: Vec<ConversionRateRow> = sqlx::query_as(
            r#"SELECT id, version, source_type, fetch_option, brand_id, environment_id,
                      status, created_at, created_by, updated_at, updated_by
               FROM conversion_rate_configs WHERE id = ? ORDER BY version DESC"#,
        )
        .bind(id)
        .fetch_all(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter()
            .map(ConversionRateRow::into_domain)
            .collect()
    }

    async fn fetch_by_scope(
        conn: &mut SqliteConnection,
        scope: &Scope,
    ) -> Result<Vec<ConversionRateConfig>, StoreError> {
        let rows: Vec<ConversionRateRow> = sqlx::query_as(
            r#"SELECT c.id, c.version, c.source_type, c.fetch_option, c.brand_id,
                      c.environment_id, c.status, c.created_at, c.created_by, c.updated_at,
                      c.updated_by
               FROM conversion_rate_configs c
               JOIN (SELECT id, MAX(version) AS version FROM conversion_rate_configs
                     WHERE brand_id = ? AND environment_id = ? GROUP BY id) latest
                 ON latest.id = c.id AND latest.version = c.version
               ORDER BY c.created_at DESC"#,
        )
        .bind(&scope.brand_id)
        .bind(&scope.environment_id)
        .fetch_all(conn)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter()
            .map(ConversionRateRow::into_domain)
            .collect()
    }

    async fn delete_parents(conn: &mut SqliteConnection, id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(r#"DELETE FROM conversion_rate_configs WHERE id = ?"#)
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn delete_children(conn: &mut SqliteConnection, id: &str) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM conversion_rate_markups WHERE config_id = ?"#)
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn before_insert(
        conn: &mut SqliteConnection,
        record: &mut ConversionRateConfig,
        markup: &MarkupValue,
    ) -> Result<(), StoreError> {
        let duplicates = count_active_pairs(
            conn,
            &record.scope,
            &markup.source_currency,
            &markup.target_currency,
            &markup.markup_option.to_string(),
            Some(&record.id),
        )
        .await?;

        if duplicates > 0 {
            return Err(StoreError::Domain(DomainError::DuplicateCurrencyPair {
                source_currency: markup.source_currency.clone(),
                target_currency: markup.target_currency.clone(),
                markup_option: markup.markup_option.to_string(),
            }));
        }

        Ok(())
    }
}

/// Markup value for one `(id, version)`.
pub(crate) async fn fetch_markup(
    conn: &mut SqliteConnection,
    id: &str,
    version: i32,
) -> Result<MarkupValue, StoreError> {
    let row: Option<MarkupRow> = sqlx::query_as(
        r#"SELECT markup_option, source_currency, target_currency, amount
           FROM conversion_rate_markups WHERE config_id = ? AND config_version = ?"#,
    )
    .bind(id)
    .bind(version)
    .fetch_optional(conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    let row = row.ok_or(StoreError::NotFound)?;

    Ok(MarkupValue {
        markup_option: parse::markup_option(&row.markup_option)?,
        source_currency: row.source_currency,
        target_currency: row.target_currency,
        amount: row.amount,
    })
}

/// Enabled latest-version configurations in scope carrying this currency
/// pair and markup option, optionally excluding one record id.
pub(crate) async fn count_active_pairs(
    conn: &mut SqliteConnection,
    scope: &Scope,
    source_currency: &str,
    target_currency: &str,
    markup_option: &str,
    exclude_id: Option<&str>,
) -> Result<i64, StoreError> {
    let count: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*)
           FROM conversion_rate_configs c
           JOIN conversion_rate_markups m
             ON m.config_id = c.id AND m.config_version = c.version
           WHERE c.brand_id = ? AND c.environment_id = ?
             AND c.status = 'ENABLED'
             AND c.version = (SELECT MAX(version) FROM conversion_rate_configs c2
                              WHERE c2.id = c.id)
             AND m.source_currency = ? AND m.target_currency = ? AND m.markup_option = ?
             AND (? IS NULL OR c.id <> ?)"#,
    )
    .bind(&scope.brand_id)
    .bind(&scope.environment_id)
    .bind(source_currency)
    .bind(target_currency)
    .bind(markup_option)
    .bind(exclude_id)
    .bind(exclude_id)
    .fetch_one(conn)
    .await
    .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(count)
}
