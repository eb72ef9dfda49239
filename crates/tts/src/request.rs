use axum::body::Body;
use serde::de::DeserializeOwned;

use crate::error::TtsError;

/// Extractor for JSON request bodies
///
/// Bodies without a `Content-Type` are parsed as JSON too. Rejections carry a
/// JSON `{"error": ...}` body and a 4xx status.
pub struct ExtractPayload<T>(pub T);

/// Body limit for synthesis requests (1 MiB)
const BODY_LIMIT_BYTES: usize = 1 << 20;

/// `application/json` or any `application/*+json` subtype, parameters ignored
fn is_json(value: &http::HeaderValue) -> bool {
    let Some(mime) = value.to_str().ok().and_then(|value| value.split(';').next()) else {
        return false;
    };
    let mime = mime.trim().to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

impl<S, T: DeserializeOwned> axum::extract::FromRequest<S> for ExtractPayload<T>
where
    S: Send + Sync,
{
    type Rejection = TtsError;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        // An absent content type is read as JSON
        if parts.headers.get(http::header::CONTENT_TYPE).is_some_and(|value| !is_json(value)) {
            return Err(TtsError::UnsupportedMediaType);
        }

        let bytes = axum::body::to_bytes(body, BODY_LIMIT_BYTES).await.map_err(|err| {
            if std::error::Error::source(&err).is_some_and(|source| source.is::<http_body_util::LengthLimitError>()) {
                TtsError::PayloadTooLarge(BODY_LIMIT_BYTES)
            } else {
                TtsError::InvalidRequest(format!("failed to read request body: {err}"))
            }
        })?;

        serde_json::from_slice::<T>(&bytes)
            .map(Self)
            .map_err(|e| TtsError::InvalidRequest(format!("failed to parse request body: {e}")))
    }
}
