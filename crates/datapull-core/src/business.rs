//! Google place types accepted by the nearby search and the colloquial
//! keywords users type for them.

pub const VALID_BUSINESS_TYPES: &[&str] = &[
    "accounting", "airport", "amusement_park", "aquarium", "art_gallery", "atm", "bakery",
    "bank", "bar", "beauty_salon", "bicycle_store", "book_store", "bowling_alley",
    "bus_station", "cafe", "campground", "car_dealer", "car_rental", "car_repair",
    "car_wash", "casino", "cemetery", "church", "city_hall", "clothing_store",
    "convenience_store", "courthouse", "dentist", "department_store", "doctor",
    "drugstore", "electrician", "electronics_store", "embassy", "fire_station",
    "florist", "funeral_home", "furniture_store", "gas_station", "gym", "hair_care",
    "hardware_store", "hindu_temple", "home_goods_store", "hospital", "insurance_agency",
    "jewelry_store", "laundry", "lawyer", "library", "light_rail_station", "liquor_store",
    "local_government_office", "locksmith", "lodging", "meal_delivery", "meal_takeaway",
    "mosque", "movie_rental", "movie_theater", "moving_company", "museum", "night_club",
    "painter", "park", "parking", "pet_store", "pharmacy", "physiotherapist", "plumber",
    "police", "post_office", "primary_school", "real_estate_agency", "restaurant",
    "roofing_contractor", "rv_park", "school", "secondary_school", "shoe_store",
    "shopping_mall", "spa", "stadium", "storage", "store", "subway_station", "supermarket",
    "synagogue", "taxi_stand", "tourist_attraction", "train_station", "transit_station",
    "travel_agency", "university", "veterinary_care", "zoo",
];

/// Keyword → place types. Order matters: matching walks it front to back.
pub const BUSINESS_TYPE_KEYWORDS: &[(&str, &[&str])] = &[
    ("restaurant", &["restaurant", "cafe", "bar", "meal_takeaway"]),
    ("cafe", &["cafe", "restaurant", "bakery"]),
    ("bar", &["bar", "night_club"]),
    ("shop", &["store", "shopping_mall", "supermarket", "clothing_store", "electronics_store"]),
    ("store", &["store", "supermarket", "convenience_store"]),
    ("supermarket", &["supermarket", "grocery_or_supermarket", "store"]),
    ("hotel", &["lodging"]),
    ("school", &["school", "primary_school", "secondary_school", "university"]),
    ("hospital", &["hospital", "doctor"]),
    ("park", &["park", "amusement_park"]),
    ("gym", &["gym"]),
    ("bank", &["bank", "atm"]),
    ("gas", &["gas_station"]),
    ("parking", &["parking"]),
    ("pharmacy", &["pharmacy", "drugstore"]),
    ("police", &["police"]),
    ("post", &["post_office"]),
    ("library", &["library"]),
    ("museum", &["museum"]),
    ("airport", &["airport"]),
    ("train", &["train_station", "transit_station"]),
    ("bus", &["bus_station", "transit_station"]),
    ("movie", &["movie_theater"]),
    ("hair", &["hair_care", "beauty_salon"]),
    ("dentist", &["dentist"]),
    ("doctor", &["doctor", "hospital"]),
    ("lawyer", &["lawyer"]),
    ("real estate", &["real_estate_agency"]),
    ("insurance", &["insurance_agency"]),
    ("car", &["car_repair", "car_wash", "car_dealer"]),
    ("factory", &["storage", "store"]),
    ("industry", &["storage", "store"]),
    ("manufacturing", &["storage", "store"]),
    ("industrial", &["storage", "store"]),
    ("warehouse", &["storage", "store"]),
];

pub fn is_valid_business_type(business_type: &str) -> bool {
    VALID_BUSINESS_TYPES.contains(&business_type)
}

pub fn keywords_for(keyword: &str) -> Option<&'static [&'static str]> {
    BUSINESS_TYPE_KEYWORDS
        .iter()
        .find(|(key, _)| *key == keyword)
        .map(|(_, types)| *types)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_business_types() {
        assert_eq!(VALID_BUSINESS_TYPES.len(), 96);
        assert!(is_valid_business_type("bakery"));
        assert!(!is_valid_business_type("bakeries"));
    }

    #[test]
    fn test_keywords_lookup() {
        assert_eq!(keywords_for("hotel"), Some(&["lodging"][..]));
        assert_eq!(keywords_for("real estate"), Some(&["real_estate_agency"][..]));
        assert!(keywords_for("spaceport").is_none());
    }
}
