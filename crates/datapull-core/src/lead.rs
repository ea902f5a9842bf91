use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{Coordinate, Error, Result};

/// Source label for leads produced by the Places API.
pub const GOOGLE_MAPS_SOURCE: &str = "Google Maps API";

/// A lead as stored in the generic `leads` table.
///
/// Deserialisation keeps any field it does not know about by moving it into
/// `source_attributes`, so hand-made import files lose nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLead")]
pub struct LeadCreate {
    pub name: String,
    pub source: String,
    pub external_id: String,
    pub business_phone: Option<String>,
    pub business_email: Option<String>,
    pub decision_maker_name: Option<String>,
    pub decision_maker_linkedin: Option<String>,
    pub decision_maker_email: Option<String>,
    pub decision_maker_phone: Option<String>,
    pub source_attributes: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawLead {
    name: String,
    source: String,
    external_id: String,
    #[serde(default)]
    business_phone: Option<String>,
    #[serde(default)]
    business_email: Option<String>,
    #[serde(default)]
    decision_maker_name: Option<String>,
    #[serde(default)]
    decision_maker_linkedin: Option<String>,
    #[serde(default)]
    decision_maker_email: Option<String>,
    #[serde(default)]
    decision_maker_phone: Option<String>,
    #[serde(default)]
    source_attributes: Option<Map<String, Value>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawLead> for LeadCreate {
    fn from(raw: RawLead) -> Self {
        let mut source_attributes = raw.source_attributes.unwrap_or_default();
        for (key, value) in raw.extra {
            source_attributes.entry(key).or_insert(value);
        }

        Self {
            name: raw.name,
            source: raw.source,
            external_id: raw.external_id,
            business_phone: raw.business_phone,
            business_email: raw.business_email,
            decision_maker_name: raw.decision_maker_name,
            decision_maker_linkedin: raw.decision_maker_linkedin,
            decision_maker_email: raw.decision_maker_email,
            decision_maker_phone: raw.decision_maker_phone,
            source_attributes,
        }
    }
}

impl LeadCreate {
    pub fn new(name: String, source: String, external_id: String) -> Self {
        Self {
            name,
            source,
            external_id,
            business_phone: None,
            business_email: None,
            decision_maker_name: None,
            decision_maker_linkedin: None,
            decision_maker_email: None,
            decision_maker_phone: None,
            source_attributes: Map::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("source", &self.source),
            ("external_id", &self.external_id),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidLead(format!("{} must not be empty", field)));
            }
        }

        if let Some(ref url) = self.decision_maker_linkedin {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::InvalidLead(format!(
                    "decision_maker_linkedin is not an http(s) URL: {}",
                    url
                )));
            }
        }

        Ok(())
    }
}

/// A business found on Google Maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleMapsLead {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub business_phone: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<i64>,
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub business_status: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub additional_properties: Map<String, Value>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub reviews: Option<Vec<Value>>,
    #[serde(default)]
    pub similar_businesses: Option<Vec<Value>>,
    #[serde(default)]
    pub about: Option<String>,
}

impl GoogleMapsLead {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            business_phone: None,
            formatted_address: None,
            website: None,
            rating: None,
            user_ratings_total: None,
            types: None,
            business_status: None,
            latitude: None,
            longitude: None,
            additional_properties: Map::new(),
            images: None,
            reviews: None,
            similar_businesses: None,
            about: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidLead("id must not be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::InvalidLead("name must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            _ => None,
        }
    }

    /// Place id recorded by the worker, falling back to the lead id.
    pub fn place_id(&self) -> &str {
        self.additional_properties
            .get("place_id")
            .and_then(Value::as_str)
            .unwrap_or(&self.id)
    }

    pub fn to_lead_create(&self) -> LeadCreate {
        let mut lead = LeadCreate::new(
            self.name.clone(),
            GOOGLE_MAPS_SOURCE.to_string(),
            self.place_id().to_string(),
        );
        lead.business_phone = self.business_phone.clone();
        lead.business_email = self
            .additional_properties
            .get("email")
            .and_then(Value::as_str)
            .map(str::to_string);

        let attributes = json!({
            "formatted_address": self.formatted_address,
            "website": self.website,
            "rating": self.rating,
            "user_ratings_total": self.user_ratings_total,
            "types": self.types.clone().unwrap_or_default(),
            "business_status": self.business_status,
            "latitude": self.latitude,
            "longitude": self.longitude,
        });
        if let Value::Object(map) = attributes {
            lead.source_attributes = map;
        }

        lead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_move_into_source_attributes() {
        let lead: LeadCreate = serde_json::from_value(json!({
            "name": "Acme Bakery",
            "source": "manual",
            "external_id": "acme-1",
            "instagram": "https://instagram.com/acme",
            "source_attributes": {"rating": 4.5}
        }))
        .unwrap();

        assert_eq!(lead.source_attributes["rating"], json!(4.5));
        assert_eq!(
            lead.source_attributes["instagram"],
            json!("https://instagram.com/acme")
        );
        assert!(lead.business_phone.is_none());
    }

    #[test]
    fn test_lead_validation() {
        let lead = LeadCreate::new("Acme".to_string(), "manual".to_string(), " ".to_string());
        assert!(matches!(lead.validate(), Err(Error::InvalidLead(_))));

        let mut lead = LeadCreate::new("Acme".to_string(), "manual".to_string(), "1".to_string());
        lead.decision_maker_linkedin = Some("linkedin.com/in/jane".to_string());
        assert!(lead.validate().is_err());

        lead.decision_maker_linkedin = Some("https://www.linkedin.com/in/jane".to_string());
        assert!(lead.validate().is_ok());
    }

    #[test]
    fn test_google_maps_lead_to_lead_create() {
        let mut lead = GoogleMapsLead::new("hash".to_string(), "Acme".to_string());
        lead.latitude = Some(41.88);
        lead.longitude = Some(-87.63);
        lead.business_phone = Some("(312) 555-0100".to_string());
        lead.additional_properties
            .insert("place_id".to_string(), json!("ChIJ123"));

        let created = lead.to_lead_create();
        assert_eq!(created.source, GOOGLE_MAPS_SOURCE);
        assert_eq!(created.external_id, "ChIJ123");
        assert_eq!(created.source_attributes["latitude"], json!(41.88));
        assert_eq!(created.source_attributes["types"], json!([]));
        assert!(created.validate().is_ok());
    }

    #[test]
    fn test_place_id_falls_back_to_id() {
        let lead = GoogleMapsLead::new("ChIJabc".to_string(), "Acme".to_string());
        assert_eq!(lead.place_id(), "ChIJabc");
        assert!(lead.coordinate().is_none());
    }
}
