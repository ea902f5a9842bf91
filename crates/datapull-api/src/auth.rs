//! API key check shared by every lead endpoint.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

use crate::error::ApiError;
use crate::state::ApiState;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_KEY_QUERY: &str = "api_key";

/// Extractor that accepts the key from the `x-api-key` header or, failing
/// that, from the `api_key` query parameter.
#[derive(Debug, Clone)]
pub struct RequireApiKey;

#[async_trait]
impl FromRequestParts<ApiState> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let provided = provided_key(parts);
        verify_api_key(provided.as_deref(), &state.api_key)
    }
}

fn provided_key(parts: &Parts) -> Option<String> {
    if let Some(key) = parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return Some(key.to_string());
    }

    Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(mut params)| params.remove(API_KEY_QUERY))
}

pub fn verify_api_key(provided: Option<&str>, expected: &str) -> Result<RequireApiKey, ApiError> {
    match provided {
        Some(key) if !expected.is_empty() && key == expected => Ok(RequireApiKey),
        Some(_) => {
            tracing::warn!("Invalid API key provided");
            Err(ApiError::Unauthorized)
        }
        None => {
            tracing::warn!("Missing API key");
            Err(ApiError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(key) = header {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_verify_api_key() {
        assert!(verify_api_key(Some("secret"), "secret").is_ok());
        assert!(verify_api_key(Some("wrong"), "secret").is_err());
        assert!(verify_api_key(None, "secret").is_err());
        assert!(verify_api_key(Some(""), "").is_err());
    }

    #[test]
    fn test_provided_key_sources() {
        assert_eq!(provided_key(&parts("/x", Some("h"))).as_deref(), Some("h"));
        assert_eq!(provided_key(&parts("/x?api_key=q", None)).as_deref(), Some("q"));
        assert_eq!(
            provided_key(&parts("/x?api_key=q", Some("h"))).as_deref(),
            Some("h")
        );
        assert_eq!(provided_key(&parts("/x?user_id=u", None)), None);
    }
}
