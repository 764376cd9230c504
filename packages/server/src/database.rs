use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::entity::upload;

pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.to_owned());

    // Set connection pool options
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    prepare_schema(&db).await?;

    Ok(db)
}

/// Create missing tables from the entity definitions and ensure indexes.
pub async fn prepare_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.get_schema_registry("server::entity::*").sync(db).await?;
    ensure_indexes(db).await
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Retention sweep and history listing:
    // SELECT ... FROM upload WHERE owner_id = ? ORDER BY uploaded_at DESC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_upload_owner_uploaded")
        .table(upload::Entity)
        .col(upload::Column::OwnerId)
        .col(upload::Column::UploadedAt)
        .to_owned();

    let sql = match db.get_database_backend() {
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        _ => stmt.to_string(PostgresQueryBuilder),
    };

    match db.execute_unprepared(&sql).await {
        Ok(_) => {
            info!("Ensured index idx_upload_owner_uploaded exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_upload_owner_uploaded: {}", e);
        }
    }

    Ok(())
}
