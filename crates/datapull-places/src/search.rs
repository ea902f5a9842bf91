//! Recursive nearby search. A circle whose response is saturated is split
//! into three overlapping sub-circles and searched again, until the lead
//! limit, the minimum radius or the maximum depth stops it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use datapull_core::geo::{three_circle_tiling, MAX_SEARCH_RADIUS_METERS};
use datapull_core::{Circle, GoogleMapsLead};
use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use tokio::sync::Mutex;

use crate::client::{PlacesApi, MAX_RESULTS_PER_QUERY};

pub const MAX_RADIUS: f64 = MAX_SEARCH_RADIUS_METERS;
pub const MIN_RADIUS: f64 = 100.0;
pub const DEFAULT_MAX_DEPTH: u32 = 3;

#[derive(Debug, Clone)]
pub struct AreaSearchResult {
    /// Leads in discovery order, one per place id.
    pub leads: Vec<GoogleMapsLead>,
    /// False when some returned place had none of the requested types.
    pub fully_matched: bool,
    pub nearby_calls: usize,
}

#[derive(Default)]
struct Collected {
    leads: Vec<GoogleMapsLead>,
    seen: HashSet<String>,
}

#[derive(Default)]
struct SearchState {
    collected: Mutex<Collected>,
    calls: AtomicUsize,
}

pub struct AreaSearch<'a> {
    api: &'a dyn PlacesApi,
    types: Vec<String>,
    max_leads: Option<usize>,
    max_depth: u32,
}

impl<'a> AreaSearch<'a> {
    pub fn new(api: &'a dyn PlacesApi, types: Vec<String>) -> Self {
        Self {
            api,
            types,
            max_leads: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_leads(mut self, max_leads: usize) -> Self {
        self.max_leads = Some(max_leads);
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub async fn run(&self, circle: Circle) -> AreaSearchResult {
        let state = SearchState::default();
        let fully_matched = self.search_area(circle, 0, &state).await;

        let collected = state.collected.into_inner();
        let nearby_calls = state.calls.load(Ordering::SeqCst);
        tracing::info!(
            "Area search for {:?} found {} places in {} nearby calls",
            self.types,
            collected.leads.len(),
            nearby_calls
        );

        AreaSearchResult {
            leads: collected.leads,
            fully_matched,
            nearby_calls,
        }
    }

    fn limit_reached(&self, collected: usize) -> bool {
        self.max_leads.is_some_and(|max| collected >= max)
    }

    fn search_area<'s>(
        &'s self,
        circle: Circle,
        depth: u32,
        state: &'s SearchState,
    ) -> BoxFuture<'s, bool> {
        async move {
            if depth > self.max_depth {
                return true;
            }
            if self.limit_reached(state.collected.lock().await.leads.len()) {
                return true;
            }

            state.calls.fetch_add(1, Ordering::SeqCst);
            let places = match self.api.search_nearby(&self.types, &circle).await {
                Ok(places) => places,
                Err(e) => {
                    tracing::error!("Nearby search failed at depth {}: {}", depth, e);
                    Vec::new()
                }
            };

            let mut fully_matched = true;
            let limit_reached = {
                let mut collected = state.collected.lock().await;
                for place in &places {
                    if self.limit_reached(collected.leads.len()) {
                        break;
                    }
                    if !place.id.is_empty() && collected.seen.insert(place.id.clone()) {
                        collected.leads.push(place.to_lead());
                    }
                    if !place.matches_any_type(&self.types) {
                        fully_matched = false;
                    }
                }
                self.limit_reached(collected.leads.len())
            };

            let saturated = places.len() >= MAX_RESULTS_PER_QUERY;
            if saturated && circle.radius_m > MIN_RADIUS && !limit_reached {
                let subareas = three_circle_tiling(&circle)
                    .into_iter()
                    .map(|sub| self.search_area(sub, depth + 1, state));
                let matched = join_all(subareas).await;
                fully_matched = fully_matched && matched.into_iter().all(|m| m);
            }

            fully_matched
        }
        .boxed()
    }
}
