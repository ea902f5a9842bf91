use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{handlers, state::ApiState};

pub fn create_router(state: ApiState, cors_origins: Option<Vec<String>>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))

        // Google Maps leads
        .route("/leads/google_maps", post(handlers::leads::create_google_maps_task))
        .route(
            "/leads/google_maps/status/:task_id",
            get(handlers::leads::get_google_maps_task_status),
        )

        // Add state
        .with_state(state)

        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
}

/// `None` allows any origin.
pub fn cors_layer(origins: Option<Vec<String>>) -> CorsLayer {
    let Some(origins) = origins else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
