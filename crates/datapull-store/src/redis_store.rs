//! # Redis
//!
//! Shared state between the API and the workers:
//!
//! - job queue: one list, `LPUSH` to enqueue, `BRPOP` to take the oldest
//! - job records: one JSON string per job, expiring after a day
//! - lead cache: one JSON array per normalised query, expiring after a day

use std::time::Duration;

use async_trait::async_trait;
use datapull_core::{FetchLeadsJob, GoogleMapsLead, JobRecord};
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use crate::ports::{serve_cached, JobQueue, JobStatusStore, LeadCache};
use crate::Result;

pub const QUEUE_KEY: &str = "datapull:queue:fetch_leads";
pub const JOB_KEY_PREFIX: &str = "datapull:job:";
pub const CACHE_KEY_PREFIX: &str = "leads:gmaps:";
pub const CACHE_TTL_SECS: u64 = 86_400;
pub const JOB_TTL_SECS: u64 = 86_400;

pub async fn connect(redis_url: &str) -> Result<ConnectionManager> {
    let client = Client::open(redis_url)?;
    let manager = client.get_connection_manager().await?;
    tracing::info!("Connected to Redis at {}", redis_url);
    Ok(manager)
}

/// `leads:gmaps:` followed by the query lowercased, trimmed, spaces as `_`.
pub fn cache_key(query: &str) -> String {
    format!(
        "{}{}",
        CACHE_KEY_PREFIX,
        query.to_lowercase().trim().replace(' ', "_")
    )
}

pub fn job_key(job_id: &str) -> String {
    format!("{}{}", JOB_KEY_PREFIX, job_id)
}

/// Clones share one multiplexed connection. A pending `dequeue` holds that
/// connection for its whole timeout, so a blocking consumer should pop on a
/// store of its own.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn connect(redis_url: &str) -> Result<Self> {
        Ok(Self::new(connect(redis_url).await?))
    }
}

#[async_trait]
impl JobQueue for RedisStore {
    async fn enqueue(&self, job: &FetchLeadsJob) -> Result<()> {
        let payload = serde_json::to_string(job)?;
        let mut conn = self.conn.clone();
        let _: i64 = conn.lpush(QUEUE_KEY, payload).await?;
        tracing::debug!("Enqueued job {}", job.id);
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<FetchLeadsJob>> {
        let mut conn = self.conn.clone();
        let popped: Option<(String, String)> = conn.brpop(QUEUE_KEY, timeout.as_secs_f64()).await?;

        match popped {
            Some((_, payload)) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl JobStatusStore for RedisStore {
    async fn save_record(&self, record: &JobRecord) -> Result<()> {
        let payload = serde_json::to_string(record)?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(job_key(record.id()), payload, JOB_TTL_SECS).await?;
        Ok(())
    }

    async fn get_record(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(job_key(job_id)).await?;
        payload
            .map(|p| serde_json::from_str(&p))
            .transpose()
            .map_err(Into::into)
    }
}

#[async_trait]
impl LeadCache for RedisStore {
    async fn get_cached_leads(&self, query: &str, max_leads: usize) -> Option<Vec<GoogleMapsLead>> {
        let mut conn = self.conn.clone();
        let cached: Option<String> = match conn.get(cache_key(query)).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::error!("Error getting cached leads: {}", e);
                return None;
            }
        };

        let leads: Vec<GoogleMapsLead> = match serde_json::from_str(&cached?) {
            Ok(leads) => leads,
            Err(e) => {
                tracing::error!("Cached leads for {:?} are unreadable: {}", query, e);
                return None;
            }
        };
        serve_cached(leads, max_leads)
    }

    async fn cache_leads(&self, query: &str, leads: &[GoogleMapsLead]) -> Result<()> {
        let payload = serde_json::to_string(leads)?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(cache_key(query), payload, CACHE_TTL_SECS).await?;
        tracing::debug!("Cached {} leads for {:?}", leads.len(), query);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key("  Bakeries in Chicago "), "leads:gmaps:bakeries_in_chicago");
        assert_eq!(cache_key("cafe"), "leads:gmaps:cafe");
    }

    #[test]
    fn test_job_key() {
        assert_eq!(job_key("abc"), "datapull:job:abc");
    }
}
