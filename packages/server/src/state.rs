use std::sync::Arc;

use common::storage::UploadStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::history::RetentionLocks;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub uploads: Arc<dyn UploadStore>,
    pub retention_locks: Arc<RetentionLocks>,
}
