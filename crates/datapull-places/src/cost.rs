use datapull_core::LeadField;
use serde::Serialize;

// USD per call
pub const NEARBY_SEARCH_COST: f64 = 0.032;
pub const PLACE_DETAILS_COST: f64 = 0.017;
pub const CONTACT_DATA_COST: f64 = 0.003;
pub const ATMOSPHERE_DATA_COST: f64 = 0.005;
pub const TEXT_SEARCH_COST: f64 = 0.032;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApiCalls {
    pub nearby_search: usize,
    pub place_details: usize,
    pub text_search: usize,
}

/// Estimated Places API spend for one fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub nearby_search: f64,
    pub place_details: f64,
    pub text_search: f64,
    pub additional_data: f64,
    pub total: f64,
}

impl CostBreakdown {
    pub fn estimate(calls: &ApiCalls, fields: &[LeadField]) -> Self {
        let nearby_search = calls.nearby_search as f64 * NEARBY_SEARCH_COST;
        let place_details = calls.place_details as f64 * PLACE_DETAILS_COST;
        let text_search = calls.text_search as f64 * TEXT_SEARCH_COST;

        let mut additional_data = 0.0;
        if fields.iter().any(LeadField::is_contact_data) {
            additional_data += calls.place_details as f64 * CONTACT_DATA_COST;
        }
        if fields.iter().any(LeadField::is_atmosphere_data) {
            additional_data += calls.place_details as f64 * ATMOSPHERE_DATA_COST;
        }

        Self {
            nearby_search,
            place_details,
            text_search,
            additional_data,
            total: nearby_search + place_details + text_search + additional_data,
        }
    }

    pub fn log(&self, calls: &ApiCalls) {
        tracing::info!(
            nearby_calls = calls.nearby_search,
            details_calls = calls.place_details,
            text_calls = calls.text_search,
            "Estimated Places API cost: ${:.2} (nearby ${:.2}, details ${:.2}, text ${:.2}, extra data ${:.2})",
            self.total,
            self.nearby_search,
            self.place_details,
            self.text_search,
            self.additional_data
        );
    }
}
