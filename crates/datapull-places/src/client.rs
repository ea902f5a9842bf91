use async_trait::async_trait;
use datapull_core::{Circle, GoogleMapsLead, LeadField};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{Error, Result};

pub const PLACES_API_URL: &str = "https://places.googleapis.com/v1";
pub const MAX_RESULTS_PER_QUERY: usize = 20;

const NEARBY_FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,\
places.types,places.businessStatus,places.location";
const TEXT_SEARCH_FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,\
places.types,places.businessStatus,places.location,nextPageToken";

/// Operations of the Places API the lead pipeline relies on.
#[async_trait]
pub trait PlacesApi: Send + Sync {
    async fn search_nearby(&self, types: &[String], circle: &Circle) -> Result<Vec<Place>>;

    async fn place_details(&self, place_id: &str, fields: &[LeadField]) -> Result<Place>;

    async fn search_text(&self, query: &str, page_token: Option<&str>) -> Result<TextSearchPage>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedText {
    pub text: String,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

/// A place as returned by the Places API (New). Only the masked fields are
/// present in a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: Option<LocalizedText>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub business_status: Option<String>,
    #[serde(default)]
    pub location: Option<LatLng>,
    #[serde(default)]
    pub national_phone_number: Option<String>,
    #[serde(default)]
    pub international_phone_number: Option<String>,
    #[serde(default)]
    pub website_uri: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_rating_count: Option<i64>,
    #[serde(default)]
    pub regular_opening_hours: Option<Value>,
    #[serde(default)]
    pub dine_in: Option<bool>,
    #[serde(default)]
    pub takeout: Option<bool>,
}

impl Place {
    pub fn name(&self) -> &str {
        self.display_name
            .as_ref()
            .map(|n| n.text.as_str())
            .unwrap_or_default()
    }

    /// True when any of the place's types is one of `types`.
    pub fn matches_any_type(&self, types: &[String]) -> bool {
        types
            .iter()
            .any(|wanted| self.types.iter().any(|t| *t == wanted.to_lowercase()))
    }

    pub fn to_lead(&self) -> GoogleMapsLead {
        let mut lead = GoogleMapsLead::new(self.id.clone(), self.name().to_string());
        self.merge_into(&mut lead);
        lead
    }

    /// Copies every field this place carries onto `lead`. Fields the place
    /// lacks leave the lead untouched.
    pub fn merge_into(&self, lead: &mut GoogleMapsLead) {
        if let Some(phone) = self
            .national_phone_number
            .as_ref()
            .or(self.international_phone_number.as_ref())
        {
            lead.business_phone = Some(phone.clone());
        }
        if let Some(ref address) = self.formatted_address {
            lead.formatted_address = Some(address.clone());
        }
        if let Some(ref website) = self.website_uri {
            lead.website = Some(website.clone());
        }
        if self.rating.is_some() {
            lead.rating = self.rating;
        }
        if self.user_rating_count.is_some() {
            lead.user_ratings_total = self.user_rating_count;
        }
        if !self.types.is_empty() {
            lead.types = Some(self.types.clone());
        }
        if let Some(ref status) = self.business_status {
            lead.business_status = Some(status.clone());
        }
        if let Some(location) = self.location {
            lead.latitude = Some(location.latitude);
            lead.longitude = Some(location.longitude);
        }

        let extras = &mut lead.additional_properties;
        if let Some(ref hours) = self.regular_opening_hours {
            extras.insert("opening_hours".to_string(), hours.clone());
        }
        if let Some(dine_in) = self.dine_in {
            extras.insert("dine_in".to_string(), Value::Bool(dine_in));
        }
        if let Some(takeout) = self.takeout {
            extras.insert("takeout".to_string(), Value::Bool(takeout));
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    places: Vec<Place>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSearchPage {
    #[serde(default)]
    pub places: Vec<Place>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

pub struct PlacesClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl PlacesClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, PLACES_API_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl PlacesApi for PlacesClient {
    async fn search_nearby(&self, types: &[String], circle: &Circle) -> Result<Vec<Place>> {
        tracing::debug!(
            "Nearby search for {:?} at ({}, {}) r={:.0}m",
            types,
            circle.center.lat,
            circle.center.lng,
            circle.radius_m
        );

        let response = self
            .client
            .post(format!("{}/places:searchNearby", self.base_url))
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", NEARBY_FIELD_MASK)
            .json(&json!({
                "locationRestriction": {
                    "circle": {
                        "center": {
                            "latitude": circle.center.lat,
                            "longitude": circle.center.lng,
                        },
                        "radius": circle.radius_m,
                    }
                },
                "includedTypes": types,
                "maxResultCount": MAX_RESULTS_PER_QUERY,
            }))
            .send()
            .await?;

        let result: PlacesResponse = Self::check(response).await?.json().await?;
        Ok(result.places)
    }

    async fn place_details(&self, place_id: &str, fields: &[LeadField]) -> Result<Place> {
        let mask: Vec<&str> = fields.iter().filter_map(LeadField::api_details).collect();
        if mask.is_empty() {
            tracing::warn!("No API fields among requested fields {:?}", fields);
            return Ok(Place {
                id: place_id.to_string(),
                ..Default::default()
            });
        }

        let response = self
            .client
            .get(format!("{}/places/{}", self.base_url, place_id))
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", mask.join(","))
            .send()
            .await?;

        let mut place: Place = Self::check(response).await?.json().await?;
        if place.id.is_empty() {
            place.id = place_id.to_string();
        }
        Ok(place)
    }

    async fn search_text(&self, query: &str, page_token: Option<&str>) -> Result<TextSearchPage> {
        let mut body = json!({
            "textQuery": query,
            "pageSize": MAX_RESULTS_PER_QUERY,
        });
        if let Some(token) = page_token {
            body["pageToken"] = Value::String(token.to_string());
        }

        let response = self
            .client
            .post(format!("{}/places:searchText", self.base_url))
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", TEXT_SEARCH_FIELD_MASK)
            .json(&body)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datapull_core::Coordinate;
    use mockito::Matcher;

    fn bakery_json() -> Value {
        json!({
            "id": "ChIJbakery",
            "displayName": {"text": "Acme Bakery", "languageCode": "en"},
            "formattedAddress": "1 Main St, Chicago, IL",
            "types": ["bakery", "food", "store"],
            "businessStatus": "OPERATIONAL",
            "location": {"latitude": 41.88, "longitude": -87.63}
        })
    }

    #[test]
    fn test_place_to_lead() {
        let place: Place = serde_json::from_value(bakery_json()).unwrap();
        let lead = place.to_lead();
        assert_eq!(lead.id, "ChIJbakery");
        assert_eq!(lead.name, "Acme Bakery");
        assert_eq!(lead.latitude, Some(41.88));
        assert_eq!(lead.types.as_deref().map(|t| t.len()), Some(3));
        assert!(place.matches_any_type(&["Bakery".to_string()]));
        assert!(!place.matches_any_type(&["bar".to_string()]));
    }

    #[test]
    fn test_merge_details_prefers_national_phone() {
        let mut lead = GoogleMapsLead::new("ChIJbakery".to_string(), "Acme".to_string());
        let details: Place = serde_json::from_value(json!({
            "nationalPhoneNumber": "(312) 555-0100",
            "internationalPhoneNumber": "+1 312-555-0100",
            "websiteUri": "https://acme.example",
            "rating": 4.6,
            "userRatingCount": 120,
            "dineIn": true
        }))
        .unwrap();

        details.merge_into(&mut lead);
        assert_eq!(lead.business_phone.as_deref(), Some("(312) 555-0100"));
        assert_eq!(lead.website.as_deref(), Some("https://acme.example"));
        assert_eq!(lead.user_ratings_total, Some(120));
        assert_eq!(lead.additional_properties["dine_in"], json!(true));
        assert!(lead.formatted_address.is_none());
    }

    #[tokio::test]
    async fn test_search_nearby() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/places:searchNearby")
            .match_header("x-goog-api-key", "test-key")
            .match_header("x-goog-fieldmask", NEARBY_FIELD_MASK)
            .match_body(Matcher::PartialJson(json!({
                "includedTypes": ["bakery"],
                "maxResultCount": 20
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"places": [bakery_json()]}).to_string())
            .create_async()
            .await;

        let client = PlacesClient::with_base_url("test-key".to_string(), server.url());
        let circle = Circle::new(Coordinate::new(41.88, -87.63), 5000.0);
        let places = client
            .search_nearby(&["bakery".to_string()], &circle)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name(), "Acme Bakery");
    }

    #[tokio::test]
    async fn test_search_nearby_empty_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/places:searchNearby")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = PlacesClient::with_base_url("k".to_string(), server.url());
        let circle = Circle::new(Coordinate::new(0.0, 0.0), 100.0);
        let places = client.search_nearby(&[], &circle).await.unwrap();
        assert!(places.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/places:searchNearby")
            .with_status(403)
            .with_body("API key not valid")
            .create_async()
            .await;

        let client = PlacesClient::with_base_url("bad".to_string(), server.url());
        let circle = Circle::new(Coordinate::new(0.0, 0.0), 100.0);
        let err = client.search_nearby(&[], &circle).await.unwrap_err();
        match err {
            Error::Api { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "API key not valid");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_place_details_field_mask() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/places/ChIJbakery")
            .match_header("x-goog-fieldmask", "websiteUri,nationalPhoneNumber")
            .with_status(200)
            .with_body(json!({"websiteUri": "https://acme.example"}).to_string())
            .create_async()
            .await;

        let client = PlacesClient::with_base_url("k".to_string(), server.url());
        let place = client
            .place_details(
                "ChIJbakery",
                &[LeadField::Website, LeadField::FormattedPhoneNumber, LeadField::Images],
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(place.id, "ChIJbakery");
        assert_eq!(place.website_uri.as_deref(), Some("https://acme.example"));
    }

    #[tokio::test]
    async fn test_place_details_without_api_fields_skips_request() {
        let client = PlacesClient::with_base_url("k".to_string(), "http://127.0.0.1:9".to_string());
        let place = client
            .place_details("ChIJbakery", &[LeadField::Reviews])
            .await
            .unwrap();
        assert_eq!(place.id, "ChIJbakery");
        assert!(place.website_uri.is_none());
    }

    #[tokio::test]
    async fn test_search_text_page_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/places:searchText")
            .match_body(Matcher::PartialJson(json!({
                "textQuery": "acme",
                "pageToken": "page-2"
            })))
            .with_status(200)
            .with_body(json!({"places": [bakery_json()], "nextPageToken": "page-3"}).to_string())
            .create_async()
            .await;

        let client = PlacesClient::with_base_url("k".to_string(), server.url());
        let page = client.search_text("acme", Some("page-2")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.places.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("page-3"));
    }
}
