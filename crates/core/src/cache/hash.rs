//! Request key generation.
//!
//! Entries are keyed by method and URL only. The URL is normalized first so
//! `https://Dash.Local/a#top` and `https://dash.local/a` share an entry.

use crate::Error;
use sha2::{Digest, Sha256};
use url::Url;

/// Normalize an absolute URL for keying: lowercase host, no fragment.
pub fn normalize_url(raw: &str) -> Result<String, Error> {
    let mut url = Url::parse(raw.trim()).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
    url.set_fragment(None);
    Ok(url.into())
}

/// Compute the storage key for a request.
pub fn compute_request_key(method: &str, normalized_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(normalized_url.as_bytes());
    hex::encode(hasher.finalize())
}
