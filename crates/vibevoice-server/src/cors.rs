use http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use vibevoice_config::{AllowList, CorsConfig};

/// Build the CORS layer for the service routes
///
/// Entries that are not valid header values are skipped with a warning.
///
/// # Errors
///
/// Returns an error if `max_age` is not a valid duration string
pub fn cors_layer(config: &CorsConfig) -> anyhow::Result<CorsLayer> {
    let mut layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]);

    layer = match &config.origins {
        // Credentialed responses cannot carry a literal `*`
        AllowList::Any if config.credentials => layer.allow_origin(AllowOrigin::mirror_request()),
        AllowList::Any => layer.allow_origin(AllowOrigin::any()),
        AllowList::Only(origins) => layer.allow_origin(parse_all::<HeaderValue>("origin", origins)),
    };

    layer = match &config.headers {
        AllowList::Any if config.credentials => layer.allow_headers(AllowHeaders::mirror_request()),
        AllowList::Any => layer.allow_headers(AllowHeaders::any()),
        AllowList::Only(headers) => layer.allow_headers(parse_all::<HeaderName>("header", headers)),
    };

    if config.credentials {
        layer = layer.allow_credentials(true);
    }

    if let Some(max_age) = config.max_age_duration()? {
        layer = layer.max_age(max_age);
    }

    Ok(layer)
}

fn parse_all<T: std::str::FromStr>(kind: &str, values: &[String]) -> Vec<T> {
    values
        .iter()
        .filter_map(|value| match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                tracing::warn!(kind, value, "ignoring invalid CORS entry");
                None
            }
        })
        .collect()
}
