use serde::{Deserialize, Serialize};

/// Words that separate the business part of a query from its location.
pub const LOCATION_INDICATORS: &[&str] = &["in", "at", "near", "around"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub business_type: String,
    pub location: String,
    pub additional_keywords: Vec<String>,
}

impl ParsedQuery {
    pub fn is_complete(&self) -> bool {
        !self.business_type.is_empty() && !self.location.is_empty()
    }
}

/// Splits "korean restaurants in san francisco" into business type and
/// location. Without an indicator the last word is taken as the location.
pub fn parse_complex_query(query: &str) -> ParsedQuery {
    let query = query.to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return ParsedQuery::default();
    }

    let (business, location) = match find_location_indicator(&words) {
        Some(index) => (&words[..index], &words[index + 1..]),
        None => (&words[..words.len() - 1], &words[words.len() - 1..]),
    };

    let additional_keywords = words
        .iter()
        .filter(|word| {
            !business.contains(word)
                && !location.contains(word)
                && !LOCATION_INDICATORS.contains(word)
        })
        .map(|word| word.to_string())
        .collect();

    ParsedQuery {
        business_type: business.join(" "),
        location: location.join(" "),
        additional_keywords,
    }
}

/// Position of the first indicator, checked in `LOCATION_INDICATORS` order.
fn find_location_indicator(words: &[&str]) -> Option<usize> {
    LOCATION_INDICATORS
        .iter()
        .find_map(|indicator| words.iter().position(|word| word == indicator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_indicator() {
        let parsed = parse_complex_query("Korean Restaurants in San Francisco");
        assert_eq!(parsed.business_type, "korean restaurants");
        assert_eq!(parsed.location, "san francisco");
        assert!(parsed.additional_keywords.is_empty());
        assert!(parsed.is_complete());
    }

    #[test]
    fn test_indicator_priority_follows_list_order() {
        // "in" wins over "near" even though "near" comes first in the query
        let parsed = parse_complex_query("cafes near parks in boston");
        assert_eq!(parsed.business_type, "cafes near parks");
        assert_eq!(parsed.location, "boston");
    }

    #[test]
    fn test_parse_without_indicator() {
        let parsed = parse_complex_query("bakeries chicago");
        assert_eq!(parsed.business_type, "bakeries");
        assert_eq!(parsed.location, "chicago");

        let parsed = parse_complex_query("chicago");
        assert_eq!(parsed.business_type, "");
        assert_eq!(parsed.location, "chicago");
        assert!(!parsed.is_complete());
    }

    #[test]
    fn test_parse_empty_query() {
        assert_eq!(parse_complex_query("   "), ParsedQuery::default());
    }

    #[test]
    fn test_trailing_indicator_leaves_location_empty() {
        let parsed = parse_complex_query("gyms around");
        assert_eq!(parsed.business_type, "gyms");
        assert_eq!(parsed.location, "");
        assert!(!parsed.is_complete());
    }
}
