use std::sync::Arc;

use datapull_core::LeadField;
use datapull_places::{LeadFetcher, NominatimGeocoder, PlacesClient};
use mockito::Matcher;
use serde_json::json;

#[tokio::test]
async fn test_nearby_fetch_against_http_services() {
    let mut server = mockito::Server::new_async().await;

    let geocode = server
        .mock("GET", "/search")
        .match_query(Matcher::UrlEncoded("q".into(), "chicago".into()))
        .with_status(200)
        .with_body(r#"[{"lat": "41.8755616", "lon": "-87.6244212"}]"#)
        .create_async()
        .await;

    let nearby = server
        .mock("POST", "/places:searchNearby")
        .match_body(Matcher::PartialJson(json!({"includedTypes": ["bakery"]})))
        .with_status(200)
        .with_body(
            json!({
                "places": [
                    {
                        "id": "ChIJ1",
                        "displayName": {"text": "Acme Bakery"},
                        "types": ["bakery"],
                        "location": {"latitude": 41.88, "longitude": -87.63}
                    },
                    {
                        "id": "ChIJ2",
                        "displayName": {"text": "Corner Cafe"},
                        "types": ["cafe"],
                        "location": {"latitude": 41.89, "longitude": -87.62}
                    }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let details = server
        .mock("GET", Matcher::Regex(r"^/places/ChIJ\d$".to_string()))
        .match_header("x-goog-fieldmask", "nationalPhoneNumber")
        .with_status(200)
        .with_body(json!({"nationalPhoneNumber": "(312) 555-0100"}).to_string())
        .expect(2)
        .create_async()
        .await;

    let api = PlacesClient::with_base_url("test-key".to_string(), server.url());
    let geocoder = NominatimGeocoder::new(server.url()).unwrap();
    let fetcher = LeadFetcher::new(Arc::new(api), Arc::new(geocoder));

    let outcome = fetcher
        .fetch_nearby(
            &["bakery".to_string()],
            "chicago",
            50,
            &[LeadField::FormattedPhoneNumber],
        )
        .await
        .unwrap();

    geocode.assert_async().await;
    nearby.assert_async().await;
    details.assert_async().await;

    assert_eq!(outcome.leads.len(), 2);
    assert!(!outcome.fully_matched);
    assert_eq!(outcome.calls.nearby_search, 1);
    assert_eq!(outcome.calls.place_details, 2);
    assert!(outcome
        .leads
        .iter()
        .all(|lead| lead.business_phone.as_deref() == Some("(312) 555-0100")));
}
