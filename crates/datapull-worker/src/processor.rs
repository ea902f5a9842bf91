use std::collections::HashSet;
use std::sync::Arc;

use datapull_core::billing::{actual_token_cost, max_token_hold};
use datapull_core::hash::business_hash;
use datapull_core::matching::resolve_business_type;
use datapull_core::query::parse_complex_query;
use datapull_core::{Error as CoreError, FetchLeadsJob, GoogleMapsLead, ResultSource};
use datapull_places::{ContactEnricher, LeadFetcher};
use datapull_store::{LeadCache, LeadRepository, TokenLedger};
use serde_json::Value;

use crate::Result;

/// Leads produced for one job.
#[derive(Debug, Clone)]
pub struct ProcessedJob {
    pub leads: Vec<GoogleMapsLead>,
    pub source: ResultSource,
    pub token_cost: i64,
}

impl ProcessedJob {
    /// Fresh leads still need caching, uploading and billing.
    pub fn needs_persisting(&self) -> bool {
        self.source != ResultSource::Cache && !self.leads.is_empty()
    }
}

pub struct JobProcessor {
    fetcher: LeadFetcher,
    enricher: Option<ContactEnricher>,
    cache: Arc<dyn LeadCache>,
    repository: Arc<dyn LeadRepository>,
    ledger: Arc<dyn TokenLedger>,
}

impl JobProcessor {
    pub fn new(
        fetcher: LeadFetcher,
        cache: Arc<dyn LeadCache>,
        repository: Arc<dyn LeadRepository>,
        ledger: Arc<dyn TokenLedger>,
    ) -> Self {
        Self {
            fetcher,
            enricher: None,
            cache,
            repository,
            ledger,
        }
    }

    pub fn with_enricher(mut self, enricher: ContactEnricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub async fn process(&self, job: &FetchLeadsJob) -> Result<ProcessedJob> {
        let max_leads = job.max_leads as usize;

        let required = max_token_hold(job.max_leads, job.fields.len());
        let available = self.ledger.get_user_tokens(&job.user_id).await?;
        if available < required {
            return Err(CoreError::InsufficientTokens {
                required,
                available,
            }
            .into());
        }

        if let Some(cached) = self.cache.get_cached_leads(&job.query, max_leads).await {
            tracing::info!("Serving {} cached leads for job {}", cached.len(), job.id);
            return Ok(ProcessedJob {
                leads: cached,
                source: ResultSource::Cache,
                token_cost: 0,
            });
        }

        let parsed = parse_complex_query(&job.query);
        let business_type = job
            .matched_business_type
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| resolve_business_type(&parsed.business_type));

        let (outcome, source) = match business_type {
            Some(business_type) if !parsed.location.is_empty() => {
                let outcome = self
                    .fetcher
                    .fetch_nearby(&[business_type], &parsed.location, max_leads, &job.fields)
                    .await?;
                (outcome, ResultSource::PlacesApi)
            }
            _ => {
                tracing::info!(
                    "No business type and location in {:?}, falling back to text search",
                    job.query
                );
                let outcome = self
                    .fetcher
                    .fetch_text(&job.query, max_leads, &job.fields)
                    .await?;
                (outcome, ResultSource::TextSearch)
            }
        };

        let mut leads = identify_leads(outcome.leads);
        if job.enrich_contacts {
            match self.enricher {
                Some(ref enricher) => {
                    enricher.enrich(&mut leads).await;
                }
                None => tracing::warn!("Contact enrichment requested but not configured"),
            }
        }

        let token_cost = actual_token_cost(leads.len(), job.fields.len());
        tracing::info!(
            "Job {} produced {} leads, cost {} tokens",
            job.id,
            leads.len(),
            token_cost
        );

        Ok(ProcessedJob {
            leads,
            source,
            token_cost,
        })
    }

    /// Caches, uploads and bills a job's fresh leads. Each step runs
    /// concurrently and failures are only logged.
    pub async fn persist(&self, job: &FetchLeadsJob, leads: &[GoogleMapsLead], token_cost: i64) {
        let (cached, uploaded, billed) = tokio::join!(
            self.cache.cache_leads(&job.query, leads),
            self.repository.upsert_google_maps_leads(leads),
            self.ledger.update_user_tokens(&job.user_id, -token_cost),
        );

        if let Err(e) = cached {
            tracing::error!("Error caching leads for job {}: {}", job.id, e);
        }
        match uploaded {
            Ok(summary) if summary.failed > 0 => {
                tracing::warn!("{} of {} leads failed to upload", summary.failed, summary.total)
            }
            Ok(_) => {}
            Err(e) => tracing::error!("Error uploading leads for job {}: {}", job.id, e),
        }
        match billed {
            Ok(balance) => tracing::info!(
                "Charged user {} {} tokens, balance {}",
                job.user_id,
                token_cost,
                balance
            ),
            Err(e) => tracing::error!("Error charging user {}: {}", job.user_id, e),
        }
    }
}

/// Replaces place ids by business hashes, keeping the place id in
/// `additional_properties`. Invalid leads, leads without coordinates and
/// leads whose hash was already seen are dropped.
fn identify_leads(leads: Vec<GoogleMapsLead>) -> Vec<GoogleMapsLead> {
    let mut seen = HashSet::new();
    let mut identified = Vec::with_capacity(leads.len());

    for mut lead in leads {
        if let Err(e) = lead.validate() {
            tracing::error!("Skipping invalid lead {}: {}", lead.id, e);
            continue;
        }
        let Some(coordinate) = lead.coordinate() else {
            tracing::error!("Missing coordinates for business: {}", lead.name);
            continue;
        };

        let hash = business_hash(&lead.name, coordinate);
        if !seen.insert(hash.clone()) {
            continue;
        }

        lead.additional_properties
            .entry("place_id")
            .or_insert_with(|| Value::String(lead.id.clone()));
        lead.id = hash;
        identified.push(lead);
    }

    identified
}
