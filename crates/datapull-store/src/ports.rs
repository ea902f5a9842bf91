//! Storage seams used by the API and the worker. Redis and Postgres back
//! them in production; [`crate::MemoryStore`] backs them everywhere else.

use std::time::Duration;

use async_trait::async_trait;
use datapull_core::{FetchLeadsJob, GoogleMapsLead, JobRecord, LeadCreate};

use crate::{Result, UploadSummary};

/// FIFO queue of jobs waiting for a worker.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: &FetchLeadsJob) -> Result<()>;

    /// Waits up to `timeout` for the oldest job.
    async fn dequeue(&self, timeout: Duration) -> Result<Option<FetchLeadsJob>>;
}

#[async_trait]
pub trait JobStatusStore: Send + Sync {
    async fn save_record(&self, record: &JobRecord) -> Result<()>;

    async fn get_record(&self, job_id: &str) -> Result<Option<JobRecord>>;
}

/// Leads cached per normalised query.
#[async_trait]
pub trait LeadCache: Send + Sync {
    /// The first `max_leads` cached leads, if at least that many are cached.
    /// Cache errors are logged and reported as a miss.
    async fn get_cached_leads(&self, query: &str, max_leads: usize) -> Option<Vec<GoogleMapsLead>>;

    async fn cache_leads(&self, query: &str, leads: &[GoogleMapsLead]) -> Result<()>;
}

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn upsert_google_maps_leads(&self, leads: &[GoogleMapsLead]) -> Result<UploadSummary>;

    async fn upsert_leads(&self, leads: &[LeadCreate]) -> Result<UploadSummary>;
}

#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Unknown users hold zero tokens.
    async fn get_user_tokens(&self, user_id: &str) -> Result<i64>;

    /// Adds `delta` (negative to deduct) and returns the new balance.
    async fn update_user_tokens(&self, user_id: &str, delta: i64) -> Result<i64>;
}

/// Slice served from a cached lead list, following the cache contract.
pub(crate) fn serve_cached(mut leads: Vec<GoogleMapsLead>, max_leads: usize) -> Option<Vec<GoogleMapsLead>> {
    if leads.len() < max_leads {
        return None;
    }
    leads.truncate(max_leads);
    Some(leads)
}
