use chrono::Utc;
use common::SummaryStats;
use common::storage::{StoredFile, UploadStore};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use tracing::{info, warn};

use super::RETENTION_WINDOW;
use super::locks::RetentionLocks;
use crate::entity::{upload, user};
use crate::error::AppError;
use crate::state::AppState;

/// Owner-scoped access to upload records and their backing files.
///
/// `None` as owner is the anonymous owner; its records are only visible to
/// anonymous requests.
pub struct HistoryStore<'a> {
    db: &'a DatabaseConnection,
    files: &'a dyn UploadStore,
    locks: &'a RetentionLocks,
}

impl<'a> HistoryStore<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        files: &'a dyn UploadStore,
        locks: &'a RetentionLocks,
    ) -> Self {
        Self { db, files, locks }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(&state.db, &*state.uploads, &state.retention_locks)
    }

    /// Persist a record for an already stored file, then sweep the owner's
    /// history down to the retention window.
    ///
    /// Insert and sweep share one transaction. On failure the stored file is
    /// removed so it cannot leak.
    pub async fn record(
        &self,
        owner: Option<i32>,
        stored: &StoredFile,
        original_name: &str,
        stats: &SummaryStats,
    ) -> Result<upload::Model, AppError> {
        let result = self.record_and_sweep(owner, stored, original_name, stats).await;

        match result {
            Ok((model, evicted)) => {
                self.remove_backing_files(&evicted).await;
                Ok(model)
            }
            Err(e) => {
                if let Err(cleanup) = self.files.delete(&stored.name).await {
                    warn!(file_name = %stored.name, error = %cleanup, "Failed to remove file of unrecorded upload");
                }
                Err(e)
            }
        }
    }

    async fn record_and_sweep(
        &self,
        owner: Option<i32>,
        stored: &StoredFile,
        original_name: &str,
        stats: &SummaryStats,
    ) -> Result<(upload::Model, Vec<upload::Model>), AppError> {
        let summary_stats = serde_json::to_value(stats)
            .map_err(|e| AppError::Internal(format!("Failed to encode stats: {e}")))?;

        let _guard = self.locks.acquire(owner).await;
        let txn = self.db.begin().await?;

        lock_owner(&txn, owner).await?;

        let model = upload::ActiveModel {
            owner_id: Set(owner),
            file_name: Set(stored.name.clone()),
            original_name: Set(original_name.to_string()),
            content_hash: Set(stored.digest.to_hex()),
            uploaded_at: Set(Utc::now()),
            total_records: Set(stats.total_count as i64),
            summary_stats: Set(summary_stats),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let evicted = enforce_retention(&txn, owner).await?;
        txn.commit().await?;

        if !evicted.is_empty() {
            info!(
                owner = ?owner,
                evicted = evicted.len(),
                "Evicted uploads beyond the retention window"
            );
        }

        Ok((model, evicted))
    }

    /// The owner's most recent records, newest first. `limit` is clamped to
    /// `1..=RETENTION_WINDOW`.
    pub async fn list_recent(
        &self,
        owner: Option<i32>,
        limit: u64,
    ) -> Result<Vec<upload::Model>, AppError> {
        let records = newest_first(owner)
            .limit(limit.clamp(1, RETENTION_WINDOW))
            .all(self.db)
            .await?;
        Ok(records)
    }

    /// Fetch one record. Records of other owners are reported as not found.
    pub async fn get(&self, owner: Option<i32>, id: i32) -> Result<upload::Model, AppError> {
        find_owned(self.db, owner, id).await
    }

    /// Delete one of the owner's records together with its backing file.
    pub async fn evict(&self, owner: Option<i32>, id: i32) -> Result<(), AppError> {
        let _guard = self.locks.acquire(owner).await;
        let txn = self.db.begin().await?;

        let record = find_owned(&txn, owner, id).await?;
        upload::Entity::delete_by_id(record.id).exec(&txn).await?;
        txn.commit().await?;

        self.remove_backing_files(std::slice::from_ref(&record)).await;
        Ok(())
    }

    /// Delete the files of records that are already gone from the database.
    ///
    /// Failures are logged, not returned: the records no longer exist, so the
    /// request that evicted them has succeeded.
    async fn remove_backing_files(&self, records: &[upload::Model]) {
        for record in records {
            match self.files.delete(&record.file_name).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(record_id = record.id, file_name = %record.file_name, "Backing file was already gone");
                }
                Err(e) => {
                    warn!(record_id = record.id, file_name = %record.file_name, error = %e, "Failed to delete backing file");
                }
            }
        }
    }
}

/// Delete every record of `owner` outside the newest [`RETENTION_WINDOW`] and
/// return the deleted rows.
///
/// Run it inside the transaction that inserted the newest record.
pub async fn enforce_retention<C: ConnectionTrait>(
    conn: &C,
    owner: Option<i32>,
) -> Result<Vec<upload::Model>, AppError> {
    let stale: Vec<upload::Model> = newest_first(owner)
        .all(conn)
        .await?
        .into_iter()
        .skip(RETENTION_WINDOW as usize)
        .collect();

    if stale.is_empty() {
        return Ok(stale);
    }

    let ids: Vec<i32> = stale.iter().map(|r| r.id).collect();
    upload::Entity::delete_many()
        .filter(upload::Column::Id.is_in(ids))
        .exec(conn)
        .await?;

    Ok(stale)
}

/// Advisory lock key serialising the anonymous owner's sweep across server
/// instances sharing one Postgres database.
const ANONYMOUS_RETENTION_LOCK: i64 = 0x6368_656d_7669_7301;

/// Take the database-side lock on `owner`'s history for the rest of the
/// transaction and check that the owner still exists.
///
/// Postgres locks the user row, or a transaction-scoped advisory lock for the
/// anonymous owner. SQLite serialises writers itself.
async fn lock_owner<C: ConnectionTrait>(
    conn: &C,
    owner: Option<i32>,
) -> Result<(), AppError> {
    let postgres = conn.get_database_backend() == DbBackend::Postgres;

    match owner {
        Some(owner_id) => {
            let mut owner_row = user::Entity::find_by_id(owner_id);
            if postgres {
                owner_row = owner_row.lock(LockType::Update);
            }
            owner_row
                .one(conn)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        }
        None if postgres => {
            conn.execute_raw(anonymous_lock_statement()).await?;
        }
        None => {}
    }
    Ok(())
}

fn anonymous_lock_statement() -> Statement {
    Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock($1)",
        [ANONYMOUS_RETENTION_LOCK.into()],
    )
}

fn owned_by(owner: Option<i32>) -> Condition {
    match owner {
        Some(id) => Condition::all().add(upload::Column::OwnerId.eq(id)),
        None => Condition::all().add(upload::Column::OwnerId.is_null()),
    }
}

fn newest_first(owner: Option<i32>) -> sea_orm::Select<upload::Entity> {
    upload::Entity::find()
        .filter(owned_by(owner))
        .order_by_desc(upload::Column::UploadedAt)
        .order_by_desc(upload::Column::Id)
}

async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    owner: Option<i32>,
    id: i32,
) -> Result<upload::Model, AppError> {
    upload::Entity::find_by_id(id)
        .filter(owned_by(owner))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload not found".into()))
}
