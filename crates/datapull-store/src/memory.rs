use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use datapull_core::{FetchLeadsJob, GoogleMapsLead, JobRecord, LeadCreate};
use tokio::sync::{Mutex, Notify, RwLock};

use crate::ports::{serve_cached, JobQueue, JobStatusStore, LeadCache, LeadRepository, TokenLedger};
use crate::redis_store::cache_key;
use crate::{Result, UploadSummary};

/// Every storage port, held in process memory.
#[derive(Default)]
pub struct MemoryStore {
    queue: Mutex<VecDeque<FetchLeadsJob>>,
    queued: Notify,
    records: RwLock<HashMap<String, JobRecord>>,
    cache: RwLock<HashMap<String, Vec<GoogleMapsLead>>>,
    google_maps_leads: RwLock<HashMap<String, GoogleMapsLead>>,
    leads: RwLock<HashMap<(String, String), LeadCreate>>,
    tokens: RwLock<HashMap<String, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_user_tokens(&self, user_id: &str, tokens: i64) {
        self.tokens.write().await.insert(user_id.to_string(), tokens);
    }

    pub async fn google_maps_leads(&self) -> Vec<GoogleMapsLead> {
        self.google_maps_leads.read().await.values().cloned().collect()
    }

    pub async fn leads(&self) -> Vec<LeadCreate> {
        self.leads.read().await.values().cloned().collect()
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }
}

#[async_trait]
impl JobQueue for MemoryStore {
    async fn enqueue(&self, job: &FetchLeadsJob) -> Result<()> {
        self.queue.lock().await.push_back(job.clone());
        self.queued.notify_one();
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<FetchLeadsJob>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(job) = self.queue.lock().await.pop_front() {
                return Ok(Some(job));
            }
            if tokio::time::timeout_at(deadline, self.queued.notified())
                .await
                .is_err()
            {
                return Ok(None);
            }
        }
    }
}

#[async_trait]
impl JobStatusStore for MemoryStore {
    async fn save_record(&self, record: &JobRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.id().to_string(), record.clone());
        Ok(())
    }

    async fn get_record(&self, job_id: &str) -> Result<Option<JobRecord>> {
        Ok(self.records.read().await.get(job_id).cloned())
    }
}

#[async_trait]
impl LeadCache for MemoryStore {
    async fn get_cached_leads(&self, query: &str, max_leads: usize) -> Option<Vec<GoogleMapsLead>> {
        let cached = self.cache.read().await.get(&cache_key(query)).cloned()?;
        serve_cached(cached, max_leads)
    }

    async fn cache_leads(&self, query: &str, leads: &[GoogleMapsLead]) -> Result<()> {
        self.cache
            .write()
            .await
            .insert(cache_key(query), leads.to_vec());
        Ok(())
    }
}

#[async_trait]
impl LeadRepository for MemoryStore {
    async fn upsert_google_maps_leads(&self, leads: &[GoogleMapsLead]) -> Result<UploadSummary> {
        let mut summary = UploadSummary::default();
        let mut stored = self.google_maps_leads.write().await;
        for lead in leads {
            let ok = lead.validate().is_ok();
            if ok {
                stored.insert(lead.id.clone(), lead.clone());
            }
            summary.record(ok);
        }
        Ok(summary)
    }

    async fn upsert_leads(&self, leads: &[LeadCreate]) -> Result<UploadSummary> {
        let mut summary = UploadSummary::default();
        let mut stored = self.leads.write().await;
        for lead in leads {
            let ok = lead.validate().is_ok();
            if ok {
                stored.insert(
                    (lead.source.clone(), lead.external_id.clone()),
                    lead.clone(),
                );
            }
            summary.record(ok);
        }
        Ok(summary)
    }
}

#[async_trait]
impl TokenLedger for MemoryStore {
    async fn get_user_tokens(&self, user_id: &str) -> Result<i64> {
        Ok(self.tokens.read().await.get(user_id).copied().unwrap_or(0))
    }

    async fn update_user_tokens(&self, user_id: &str, delta: i64) -> Result<i64> {
        let mut tokens = self.tokens.write().await;
        let balance = tokens.entry(user_id.to_string()).or_insert(0);
        *balance += delta;
        Ok(*balance)
    }
}
