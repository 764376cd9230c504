pub mod ingest;
pub mod storage;

pub use ingest::{HealthStatus, IngestError, IngestReport, SummaryStats, ingest};
