use std::collections::HashSet;
use std::sync::Arc;

use datapull_core::fields::{parse_fields, scraper_only};
use datapull_core::geo::search_circle_for;
use datapull_core::{Error as CoreError, GoogleMapsLead, LeadField};
use futures_util::{stream, StreamExt};

use crate::client::PlacesApi;
use crate::cost::{ApiCalls, CostBreakdown};
use crate::geocode::{bounding_box_for, Geocoder};
use crate::search::AreaSearch;
use crate::Result;

pub const DETAILS_CONCURRENCY: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub leads: Vec<GoogleMapsLead>,
    pub fully_matched: bool,
    pub calls: ApiCalls,
    pub cost: CostBreakdown,
}

/// Parses requested field names and rejects the ones only the browser
/// scraper could provide.
pub fn validate_fields<S: AsRef<str>>(names: &[S]) -> std::result::Result<Vec<LeadField>, CoreError> {
    let fields = parse_fields(names)?;
    ensure_api_fields(&fields)?;
    Ok(fields)
}

fn ensure_api_fields(fields: &[LeadField]) -> std::result::Result<(), CoreError> {
    let unsupported = scraper_only(fields);
    if unsupported.is_empty() {
        return Ok(());
    }
    let names: Vec<&str> = unsupported.iter().map(LeadField::as_str).collect();
    Err(CoreError::ScraperRequired(names.join(", ")))
}

pub struct LeadFetcher {
    api: Arc<dyn PlacesApi>,
    geocoder: Arc<dyn Geocoder>,
}

impl LeadFetcher {
    pub fn new(api: Arc<dyn PlacesApi>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { api, geocoder }
    }

    /// Collects up to `max_leads` places of `types` around `location`.
    pub async fn fetch_nearby(
        &self,
        types: &[String],
        location: &str,
        max_leads: usize,
        fields: &[LeadField],
    ) -> Result<FetchOutcome> {
        tracing::info!("Fetching leads for {:?} in {}", types, location);
        ensure_api_fields(fields)?;

        let Some(bbox) = bounding_box_for(self.geocoder.as_ref(), location).await? else {
            tracing::warn!("Could not find bounding box for location: {}", location);
            return Ok(FetchOutcome::default());
        };

        let circle = search_circle_for(&bbox);
        let search = AreaSearch::new(self.api.as_ref(), types.to_vec())
            .with_max_leads(max_leads)
            .run(circle)
            .await;

        let mut calls = ApiCalls {
            nearby_search: search.nearby_calls,
            ..Default::default()
        };
        let mut leads = search.leads;

        if !fields.is_empty() {
            calls.place_details = leads.len();
            self.apply_details(&mut leads, fields).await;
        }
        leads.truncate(max_leads);

        tracing::info!("Total unique places found: {}", leads.len());
        let cost = CostBreakdown::estimate(&calls, fields);
        cost.log(&calls);

        Ok(FetchOutcome {
            leads,
            fully_matched: search.fully_matched,
            calls,
            cost,
        })
    }

    async fn apply_details(&self, leads: &mut [GoogleMapsLead], fields: &[LeadField]) {
        let requests: Vec<(usize, String)> = leads
            .iter()
            .enumerate()
            .map(|(i, lead)| (i, lead.id.clone()))
            .collect();

        let api = self.api.as_ref();
        let details: Vec<(usize, Option<_>)> = stream::iter(requests)
            .map(|(i, place_id)| async move {
                match api.place_details(&place_id, fields).await {
                    Ok(place) => (i, Some(place)),
                    Err(e) => {
                        tracing::error!("Error fetching details for {}: {}", place_id, e);
                        (i, None)
                    }
                }
            })
            .buffer_unordered(DETAILS_CONCURRENCY)
            .collect()
            .await;

        for (i, place) in details {
            if let Some(place) = place {
                place.merge_into(&mut leads[i]);
            }
        }
    }

    /// Free-text search, page by page, until `max_leads` or the last page.
    /// Requested `fields` are fetched per lead the same way as nearby results.
    pub async fn fetch_text(
        &self,
        query: &str,
        max_leads: usize,
        fields: &[LeadField],
    ) -> Result<FetchOutcome> {
        tracing::info!("Text search for {:?}", query);
        ensure_api_fields(fields)?;

        let mut leads = Vec::new();
        let mut seen = HashSet::new();
        let mut calls = ApiCalls::default();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.api.search_text(query, page_token.as_deref()).await?;
            calls.text_search += 1;

            for place in &page.places {
                if leads.len() >= max_leads {
                    break;
                }
                if !place.id.is_empty() && seen.insert(place.id.clone()) {
                    leads.push(place.to_lead());
                }
            }

            match page.next_page_token {
                Some(token) if leads.len() < max_leads && page_token.as_ref() != Some(&token) => {
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        tracing::info!("Text search found {} places in {} pages", leads.len(), calls.text_search);
        if !fields.is_empty() {
            calls.place_details = leads.len();
            self.apply_details(&mut leads, fields).await;
        }
        let cost = CostBreakdown::estimate(&calls, fields);
        cost.log(&calls);

        Ok(FetchOutcome {
            leads,
            fully_matched: true,
            calls,
            cost,
        })
    }
}
