use common::SummaryStats;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One retained upload: who uploaded which file, when, and its statistics.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "upload")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// NULL for anonymous uploads.
    pub owner_id: Option<i32>,
    #[sea_orm(belongs_to, from = "owner_id", to = "id")]
    pub owner: HasOne<super::user::Entity>,

    /// Name of the backing file in the upload store.
    pub file_name: String,
    /// Filename as sent by the client.
    pub original_name: String,
    /// SHA-256 of the backing file, hex encoded.
    pub content_hash: String,

    pub uploaded_at: DateTimeUtc,
    pub total_records: i64,

    /// [`SummaryStats`] as JSON.
    #[sea_orm(column_type = "JsonBinary")]
    pub summary_stats: serde_json::Value,
}

impl Model {
    pub fn stats(&self) -> Result<SummaryStats, serde_json::Error> {
        serde_json::from_value(self.summary_stats.clone())
    }
}

impl ActiveModelBehavior for ActiveModel {}
