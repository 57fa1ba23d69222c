//! URL resolution for intercepted requests.
//!
//! The dashboard issues both absolute URLs and origin-relative paths
//! (`/styles.css`); both are turned into one absolute form before
//! classification and cache keying.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported origin scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse the application origin. Only http(s) origins can host the worker.
pub fn parse_origin(input: &str) -> Result<Url, UrlError> {
    let origin = Url::parse(input.trim()).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    match origin.scheme() {
        "http" | "https" => Ok(origin),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

/// Resolve a request URL against the application origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative references against `origin`
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
///
/// Any scheme is accepted here; deciding what to intercept is the
/// classifier's job.
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = Url::options()
        .base_url(Some(origin))
        .parse(trimmed)
        .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    if let Some(host) = parsed.host_str()
        && host.chars().any(|c| c.is_ascii_uppercase())
    {
        let lower = host.to_ascii_lowercase();
        parsed
            .set_host(Some(&lower))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}
