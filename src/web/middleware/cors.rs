//! CORS middleware configuration.

use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

fn csrf_header() -> HeaderName {
    HeaderName::from_static("x-csrf-token")
}

/// Create a CORS layer from configuration.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::OPTIONS,
    ];

    let parsed_origins: Vec<HeaderValue> =
        origins.iter().filter_map(|o| o.parse().ok()).collect();

    if parsed_origins.is_empty() {
        // Development mode: any origin, no credentials
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_origin(Any)
            .expose_headers([csrf_header()])
    } else {
        // Cookies carry the session, so listed origins get credentials
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT, csrf_header()])
            .expose_headers([csrf_header()])
            .allow_credentials(true)
            .allow_origin(parsed_origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_cors_layer_empty_origins() {
        let _layer = create_cors_layer(&[]);
        // Should not panic
    }

    #[test]
    fn test_create_cors_layer_with_origins() {
        let origins = vec![
            "http://localhost:3000".to_string(),
            "http://localhost:5173".to_string(),
        ];
        let _layer = create_cors_layer(&origins);
        // Should not panic
    }
}
