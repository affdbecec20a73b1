//! Generic append-only store for scoped, versioned records.
//!
//! All four record kinds share the same lifecycle: version 1 on create,
//! latest+1 on update, children re-materialized per version, delete removes
//! every version. `ScopedStore` implements that lifecycle once; the kinds
//! plug in their table SQL and their successor constructor through
//! [`RecordKind`]. Kind-specific invariants (duplicate currency pairs,
//! routing defaults) hook into the same transaction via `before_insert` and
//! `before_delete`.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};

use pspconfig_types::{Scope, StoreError, Versioned};

/// Table bindings and versioning rules for one record kind.
///
/// Hook methods take a bare connection so they compose under one
/// transaction; the engine owns begin/commit.
#[async_trait]
pub(crate) trait RecordKind: Send + Sync + 'static {
    type Record: Versioned + Clone + Send + Sync + 'static;
    type Children: Send + Sync + 'static;
    type Update: Send + 'static;

    /// Kind tag used in log lines.
    const KIND: &'static str;

    /// Builds the successor of `latest` from an update payload. Carries
    /// identity and creation audit fields, bumps the version by 1.
    fn next_version(latest: &Self::Record, update: Self::Update)
    -> (Self::Record, Self::Children);

    async fn insert_parent(
        conn: &mut SqliteConnection,
        record: &Self::Record,
    ) -> Result<(), StoreError>;

    async fn insert_children(
        conn: &mut SqliteConnection,
        id: &str,
        version: i32,
        children: &Self::Children,
    ) -> Result<(), StoreError>;

    async fn fetch_latest(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<Option<Self::Record>, StoreError>;

    async fn fetch_versions(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<Vec<Self::Record>, StoreError>;

    async fn fetch_by_scope(
        conn: &mut SqliteConnection,
        scope: &Scope,
    ) -> Result<Vec<Self::Record>, StoreError>;

    async fn delete_parents(conn: &mut SqliteConnection, id: &str) -> Result<u64, StoreError>;

    async fn delete_children(conn: &mut SqliteConnection, id: &str) -> Result<(), StoreError>;

    /// Runs inside the insert transaction, before the parent row is
    /// written. May adjust the record (routing default promotion) or fail
    /// the whole transaction (duplicate currency pair).
    async fn before_insert(
        conn: &mut SqliteConnection,
        record: &mut Self::Record,
        children: &Self::Children,
    ) -> Result<(), StoreError> {
        let _ = (conn, record, children);
        Ok(())
    }

    /// Runs inside the delete transaction, before any row is removed.
    async fn before_delete(conn: &mut SqliteConnection, id: &str) -> Result<(), StoreError> {
        let _ = (conn, id);
        Ok(())
    }
}

/// The shared lifecycle engine over one record kind's tables.
pub(crate) struct ScopedStore<K> {
    pool: SqlitePool,
    _kind: PhantomData<K>,
}

impl<K: RecordKind> ScopedStore<K> {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _kind: PhantomData,
        }
    }

    /// Inserts a record and its children in one transaction. Returns the
    /// record as written, after any `before_insert` adjustment.
    pub(crate) async fn create(
        &self,
        mut record: K::Record,
        children: &K::Children,
    ) -> Result<K::Record, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        K::before_insert(&mut *tx, &mut record, children).await?;
        K::insert_parent(&mut *tx, &record).await?;
        K::insert_children(&mut *tx, record.record_id(), record.record_version(), children)
            .await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        tracing::debug!(kind = K::KIND, id = record.record_id(), "record created");
        Ok(record)
    }

    /// Publishes the next version of an existing record. The latest-version
    /// read, the successor insert and the child writes share one
    /// transaction, so concurrent updates serialize instead of both writing
    /// the same version number.
    pub(crate) async fn create_new_version(
        &self,
        id: &str,
        update: K::Update,
    ) -> Result<K::Record, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        let latest = K::fetch_latest(&mut *tx, id)
            .await?
            .ok_or(StoreError::NotFound)?;

        let (mut record, children) = K::next_version(&latest, update);

        K::before_insert(&mut *tx, &mut record, &children).await?;
        K::insert_parent(&mut *tx, &record).await?;
        K::insert_children(&mut *tx, record.record_id(), record.record_version(), &children)
            .await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        tracing::debug!(
            kind = K::KIND,
            id,
            version = record.record_version(),
            "record version published"
        );
        Ok(record)
    }

    pub(crate) async fn find_latest(&self, id: &str) -> Result<Option<K::Record>, StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        K::fetch_latest(&mut *conn, id).await
    }

    /// All versions, newest first.
    pub(crate) async fn find_all_versions(&self, id: &str) -> Result<Vec<K::Record>, StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        K::fetch_versions(&mut *conn, id).await
    }

    /// Latest version of every record in the scope.
    pub(crate) async fn find_by_scope(&self, scope: &Scope) -> Result<Vec<K::Record>, StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        K::fetch_by_scope(&mut *conn, scope).await
    }

    /// Deletes every version and all child rows. Returns the number of
    /// parent rows removed; an unknown id is `NotFound`.
    pub(crate) async fn delete_all(&self, id: &str) -> Result<u64, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        K::before_delete(&mut *tx, id).await?;
        K::delete_children(&mut *tx, id).await?;
        let removed = K::delete_parents(&mut *tx, id).await?;

        if removed == 0 {
            return Err(StoreError::NotFound);
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        tracing::debug!(kind = K::KIND, id, versions = removed, "record deleted");
        Ok(removed)
    }
}
