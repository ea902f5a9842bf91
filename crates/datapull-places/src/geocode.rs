use async_trait::async_trait;
use datapull_core::geo::{bounding_box_around, DEFAULT_BOUNDING_BOX_RADIUS_KM};
use datapull_core::{BoundingBox, Coordinate};
use reqwest::Client;
use serde::Deserialize;

use crate::{Error, Result};

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const USER_AGENT: &str = concat!("datapull/", env!("CARGO_PKG_VERSION"), " (lead search)");

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `None` when the address is not known.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>>;
}

pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimHit {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: String) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Geocode(format!("{}: {}", status, body)));
        }

        let hits: Vec<NominatimHit> = response.json().await?;
        let Some(hit) = hits.into_iter().next() else {
            tracing::warn!("Could not find coordinates for address: {}", address);
            return Ok(None);
        };

        let lat = hit
            .lat
            .parse::<f64>()
            .map_err(|e| Error::Geocode(format!("bad latitude {:?}: {}", hit.lat, e)))?;
        let lng = hit
            .lon
            .parse::<f64>()
            .map_err(|e| Error::Geocode(format!("bad longitude {:?}: {}", hit.lon, e)))?;

        Ok(Some(Coordinate::new(lat, lng)))
    }
}

/// Box of [`DEFAULT_BOUNDING_BOX_RADIUS_KM`] around `location`.
pub async fn bounding_box_for(geocoder: &dyn Geocoder, location: &str) -> Result<Option<BoundingBox>> {
    Ok(geocoder
        .geocode(location)
        .await?
        .map(|center| bounding_box_around(center, DEFAULT_BOUNDING_BOX_RADIUS_KM)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_geocode_found() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "chicago".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .match_header("user-agent", Matcher::Regex("^datapull/".to_string()))
            .with_status(200)
            .with_body(r#"[{"lat": "41.8755616", "lon": "-87.6244212", "display_name": "Chicago"}]"#)
            .create_async()
            .await;

        let geocoder = NominatimGeocoder::new(server.url()).unwrap();
        let found = geocoder.geocode("chicago").await.unwrap().unwrap();

        mock.assert_async().await;
        assert!((found.lat - 41.8755616).abs() < 1e-9);
        assert!((found.lng + 87.6244212).abs() < 1e-9);

        let bbox = bounding_box_for(&geocoder, "chicago").await.unwrap().unwrap();
        assert!(bbox.contains(found));
    }

    #[tokio::test]
    async fn test_geocode_unknown_address() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let geocoder = NominatimGeocoder::new(server.url()).unwrap();
        assert!(geocoder.geocode("atlantis").await.unwrap().is_none());
        assert!(bounding_box_for(&geocoder, "atlantis").await.unwrap().is_none());
    }
}
