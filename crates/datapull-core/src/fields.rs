//! Optional lead fields a client can ask for, and how each one is named by
//! the Places API, by the scraper and in responses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    Name,
    FormattedAddress,
    BusinessStatus,
    Location,
    Types,
    FormattedPhoneNumber,
    InternationalPhoneNumber,
    Website,
    Rating,
    UserRatingsTotal,
    OpeningHours,
    DineIn,
    Takeout,
    // Scraper only
    Images,
    Reviews,
    SimilarBusinesses,
    About,
    AdditionalProperties,
}

impl LeadField {
    pub const ALL: [LeadField; 18] = [
        LeadField::Name,
        LeadField::FormattedAddress,
        LeadField::BusinessStatus,
        LeadField::Location,
        LeadField::Types,
        LeadField::FormattedPhoneNumber,
        LeadField::InternationalPhoneNumber,
        LeadField::Website,
        LeadField::Rating,
        LeadField::UserRatingsTotal,
        LeadField::OpeningHours,
        LeadField::DineIn,
        LeadField::Takeout,
        LeadField::Images,
        LeadField::Reviews,
        LeadField::SimilarBusinesses,
        LeadField::About,
        LeadField::AdditionalProperties,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadField::Name => "name",
            LeadField::FormattedAddress => "formatted_address",
            LeadField::BusinessStatus => "business_status",
            LeadField::Location => "location",
            LeadField::Types => "types",
            LeadField::FormattedPhoneNumber => "formatted_phone_number",
            LeadField::InternationalPhoneNumber => "international_phone_number",
            LeadField::Website => "website",
            LeadField::Rating => "rating",
            LeadField::UserRatingsTotal => "user_ratings_total",
            LeadField::OpeningHours => "opening_hours",
            LeadField::DineIn => "dine_in",
            LeadField::Takeout => "takeout",
            LeadField::Images => "images",
            LeadField::Reviews => "reviews",
            LeadField::SimilarBusinesses => "similar_businesses",
            LeadField::About => "about",
            LeadField::AdditionalProperties => "additional_properties",
        }
    }

    /// Place details field name, `None` for scraper-only fields.
    pub fn api_details(&self) -> Option<&'static str> {
        let name = match self {
            LeadField::Name => "displayName",
            LeadField::FormattedAddress => "formattedAddress",
            LeadField::BusinessStatus => "businessStatus",
            LeadField::Location => "location",
            LeadField::Types => "types",
            LeadField::FormattedPhoneNumber => "nationalPhoneNumber",
            LeadField::InternationalPhoneNumber => "internationalPhoneNumber",
            LeadField::Website => "websiteUri",
            LeadField::Rating => "rating",
            LeadField::UserRatingsTotal => "userRatingCount",
            LeadField::OpeningHours => "regularOpeningHours",
            LeadField::DineIn => "dineIn",
            LeadField::Takeout => "takeout",
            _ => return None,
        };
        Some(name)
    }

    /// Nearby search field mask entry, e.g. `places.displayName`.
    pub fn api_nearby(&self) -> Option<String> {
        self.api_details().map(|name| format!("places.{}", name))
    }

    pub fn scraper_key(&self) -> &'static str {
        match self {
            LeadField::FormattedAddress => "address",
            LeadField::BusinessStatus => "business_type",
            LeadField::FormattedPhoneNumber => "phone",
            LeadField::InternationalPhoneNumber => "international_phone",
            LeadField::UserRatingsTotal => "num_reviews",
            LeadField::OpeningHours => "hours",
            other => other.as_str(),
        }
    }

    pub fn response_key(&self) -> &'static str {
        self.as_str()
    }

    pub fn is_scraper_only(&self) -> bool {
        self.api_details().is_none()
    }

    pub fn is_contact_data(&self) -> bool {
        matches!(
            self,
            LeadField::FormattedPhoneNumber
                | LeadField::InternationalPhoneNumber
                | LeadField::OpeningHours
                | LeadField::Website
        )
    }

    pub fn is_atmosphere_data(&self) -> bool {
        matches!(
            self,
            LeadField::Rating | LeadField::UserRatingsTotal | LeadField::Reviews
        )
    }
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LeadField::ALL
            .iter()
            .find(|field| field.as_str() == s)
            .copied()
            .ok_or_else(|| invalid_fields(&[s]))
    }
}

fn invalid_fields(names: &[&str]) -> Error {
    let mut valid: Vec<&str> = LeadField::ALL.iter().map(LeadField::as_str).collect();
    valid.sort_unstable();
    Error::InvalidFields {
        invalid: names.join(", "),
        valid: valid.join(", "),
    }
}

/// Parses requested field names, reporting every unknown one at once.
pub fn parse_fields<S: AsRef<str>>(names: &[S]) -> Result<Vec<LeadField>> {
    let mut fields = Vec::with_capacity(names.len());
    let mut invalid = Vec::new();

    for name in names {
        let name = name.as_ref().trim();
        match LeadField::ALL.iter().find(|field| field.as_str() == name) {
            Some(field) if !fields.contains(field) => fields.push(*field),
            Some(_) => {}
            None => invalid.push(name),
        }
    }

    if !invalid.is_empty() {
        return Err(invalid_fields(&invalid));
    }
    Ok(fields)
}

pub fn requires_scraper(fields: &[LeadField]) -> bool {
    fields.iter().any(LeadField::is_scraper_only)
}

pub fn scraper_only(fields: &[LeadField]) -> Vec<LeadField> {
    fields.iter().copied().filter(LeadField::is_scraper_only).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        assert_eq!(LeadField::Name.api_nearby().as_deref(), Some("places.displayName"));
        assert_eq!(LeadField::Website.api_details(), Some("websiteUri"));
        assert_eq!(LeadField::UserRatingsTotal.scraper_key(), "num_reviews");
        assert_eq!(LeadField::Rating.scraper_key(), "rating");
        assert_eq!(LeadField::Reviews.api_details(), None);
        assert_eq!(
            "international_phone_number".parse::<LeadField>().unwrap(),
            LeadField::InternationalPhoneNumber
        );
        assert_eq!(LeadField::DineIn.to_string(), "dine_in");
    }

    #[test]
    fn test_parse_fields() {
        let fields = parse_fields(&["website", "rating", "website"]).unwrap();
        assert_eq!(fields, vec![LeadField::Website, LeadField::Rating]);

        let err = parse_fields(&["website", "fax", "mood"]).unwrap_err();
        match err {
            Error::InvalidFields { invalid, valid } => {
                assert_eq!(invalid, "fax, mood");
                assert!(valid.contains("formatted_phone_number"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let empty: [&str; 0] = [];
        assert!(parse_fields(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_scraper_fields() {
        assert!(requires_scraper(&[LeadField::Website, LeadField::Images]));
        assert!(!requires_scraper(&[LeadField::Website]));
        assert_eq!(
            scraper_only(&[LeadField::About, LeadField::Rating]),
            vec![LeadField::About]
        );
    }

    #[test]
    fn test_pricing_categories() {
        assert!(LeadField::OpeningHours.is_contact_data());
        assert!(LeadField::Reviews.is_atmosphere_data());
        assert!(!LeadField::Name.is_contact_data());
        assert!(!LeadField::Name.is_atmosphere_data());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&LeadField::UserRatingsTotal).unwrap();
        assert_eq!(json, "\"user_ratings_total\"");
    }
}
