//! Request classification.
//!
//! Decides which strategy handles a request. The result depends only on the
//! method and URL, never on earlier requests. Rules, first match wins:
//!
//! 1. non-GET → [`Classification::Excluded`]
//! 2. non-http(s) scheme → [`Classification::Excluded`]
//! 3. host is an excluded domain or one of its subdomains →
//!    [`Classification::HostnameExcluded`]
//! 4. host+path carries a tile or CDN marker → [`Classification::TileOrCdn`]
//! 5. host+path carries an API/auth marker → [`Classification::ApiOnly`]
//! 6. anything else → [`Classification::DefaultStatic`]
//!
//! Domain matching is label-exact: `spotify.com` covers `api.spotify.com`
//! but not `evilspotify.com` or `spotify.com.attacker.net`.

use std::fmt;

use cardash_core::{AppConfig, Request};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::resolve;

/// Strategy class of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// Not intercepted; passed straight to the network.
    Excluded,
    /// Third-party auth/streaming/API domain; bypasses the cache layer.
    HostnameExcluded,
    /// Map tile or CDN asset; network-first with runtime fallback.
    TileOrCdn,
    /// API or auth call; network only.
    ApiOnly,
    /// App shell and static assets; cache-first, precache-eligible.
    DefaultStatic,
}

impl Classification {
    /// Whether requests of this class may read or write a partition.
    pub fn uses_cache(self) -> bool {
        matches!(self, Classification::TileOrCdn | Classification::DefaultStatic)
    }

    /// Kebab-case name, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Excluded => "excluded",
            Classification::HostnameExcluded => "hostname-excluded",
            Classification::TileOrCdn => "tile-or-cdn",
            Classification::ApiOnly => "api-only",
            Classification::DefaultStatic => "default-static",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain and marker lists driving rules 3 to 5.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRules {
    pub excluded_domains: Vec<String>,
    pub tile_markers: Vec<String>,
    pub cdn_markers: Vec<String>,
    pub api_markers: Vec<String>,
}

impl From<&AppConfig> for ExclusionRules {
    fn from(config: &AppConfig) -> Self {
        Self {
            excluded_domains: config
                .excluded_domains
                .iter()
                .map(|d| d.trim_end_matches('.').to_ascii_lowercase())
                .collect(),
            tile_markers: config.tile_markers.clone(),
            cdn_markers: config.cdn_markers.clone(),
            api_markers: config.api_markers.clone(),
        }
    }
}

impl ExclusionRules {
    fn is_excluded_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.');
        self.excluded_domains.iter().any(|domain| {
            host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        })
    }

    fn is_tile_or_cdn(&self, locator: &str) -> bool {
        contains_any(locator, &self.tile_markers) || contains_any(locator, &self.cdn_markers)
    }

    fn is_api(&self, locator: &str) -> bool {
        contains_any(locator, &self.api_markers)
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}

/// Stateless request classifier bound to the application origin.
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Url,
    rules: ExclusionRules,
}

impl Classifier {
    pub fn new(origin: Url, rules: ExclusionRules) -> Self {
        Self { origin, rules }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Classify an already resolved URL.
    pub fn classify(&self, method: &str, url: &Url) -> Classification {
        if !method.eq_ignore_ascii_case("GET") {
            return Classification::Excluded;
        }

        if !matches!(url.scheme(), "http" | "https") {
            return Classification::Excluded;
        }

        let host = url.host_str().unwrap_or_default();
        if self.rules.is_excluded_host(host) {
            return Classification::HostnameExcluded;
        }

        // Markers see host and path only, so a query string cannot opt a
        // request into or out of caching.
        let locator = format!("{host}{}", url.path());

        if self.rules.is_tile_or_cdn(&locator) {
            Classification::TileOrCdn
        } else if self.rules.is_api(&locator) {
            Classification::ApiOnly
        } else {
            Classification::DefaultStatic
        }
    }

    /// Resolve and classify a request.
    ///
    /// An unparseable URL classifies as [`Classification::Excluded`] and
    /// yields no resolved URL.
    pub fn classify_request(&self, request: &Request) -> (Classification, Option<Url>) {
        match resolve(&self.origin, &request.url) {
            Ok(url) => (self.classify(&request.method, &url), Some(url)),
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "unparseable request URL, not intercepting");
                (Classification::Excluded, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::parse_origin;

    fn classifier() -> Classifier {
        let config = AppConfig::default();
        Classifier::new(parse_origin("https://dash.local").unwrap(), ExclusionRules::from(&config))
    }

    fn classify(method: &str, url: &str) -> Classification {
        classifier().classify_request(&Request::new(method, url)).0
    }

    #[test]
    fn test_non_get_excluded() {
        assert_eq!(classify("POST", "/styles.css"), Classification::Excluded);
        assert_eq!(classify("PUT", "https://tile.example/1/2/3.pbf"), Classification::Excluded);
    }

    #[test]
    fn test_non_http_scheme_excluded() {
        assert_eq!(classify("GET", "chrome-extension://abc/inject.js"), Classification::Excluded);
        assert_eq!(classify("GET", "data:text/plain,hi"), Classification::Excluded);
    }

    #[test]
    fn test_unparseable_url_excluded() {
        let (class, url) = classifier().classify_request(&Request::get("http://[::1"));
        assert_eq!(class, Classification::Excluded);
        assert!(url.is_none());

        assert_eq!(classify("GET", ""), Classification::Excluded);
    }

    #[test]
    fn test_excluded_domain_and_subdomains() {
        assert_eq!(classify("GET", "https://spotify.com/"), Classification::HostnameExcluded);
        assert_eq!(classify("GET", "https://api.spotify.com/v1/me"), Classification::HostnameExcluded);
        assert_eq!(classify("GET", "https://web.telegram.org/k/"), Classification::HostnameExcluded);
    }

    #[test]
    fn test_lookalike_domains_not_excluded() {
        assert_ne!(classify("GET", "https://evilspotify.com/"), Classification::HostnameExcluded);
        assert_ne!(
            classify("GET", "https://spotify.com.attacker.net/"),
            Classification::HostnameExcluded
        );
        assert_ne!(classify("GET", "https://notspotify.com/"), Classification::HostnameExcluded);
    }

    #[test]
    fn test_configured_domain_trailing_dot_still_matches() {
        let config = AppConfig { excluded_domains: vec!["spotify.com.".into()], ..Default::default() };
        let rules = ExclusionRules::from(&config);
        assert_eq!(rules.excluded_domains, vec!["spotify.com"]);

        let classifier = Classifier::new(parse_origin("https://dash.local").unwrap(), rules);
        let url = Url::parse("https://api.spotify.com/v1/me").unwrap();
        assert_eq!(classifier.classify("GET", &url), Classification::HostnameExcluded);
        let url = Url::parse("https://spotify.com./").unwrap();
        assert_eq!(classifier.classify("GET", &url), Classification::HostnameExcluded);
    }

    #[test]
    fn test_excluded_domain_beats_tile_marker() {
        // sdk.scdn.co is a CDN marker, but open.spotify.com is excluded first
        assert_eq!(
            classify("GET", "https://open.spotify.com/tiles/sdk.scdn.co"),
            Classification::HostnameExcluded
        );
    }

    #[test]
    fn test_tile_and_cdn() {
        assert_eq!(classify("GET", "https://tile.example/1/2/3.pbf"), Classification::TileOrCdn);
        assert_eq!(
            classify("GET", "https://demotiles.maplibre.org/style.json"),
            Classification::TileOrCdn
        );
        assert_eq!(
            classify("GET", "https://unpkg.com/maplibre-gl/dist/maplibre-gl.js"),
            Classification::TileOrCdn
        );
        assert_eq!(classify("GET", "https://sdk.scdn.co/spotify-player.js"), Classification::TileOrCdn);
        assert_eq!(
            classify("GET", "https://cdnjs.cloudflare.com/ajax/libs/x.js"),
            Classification::TileOrCdn
        );
    }

    #[test]
    fn test_tile_beats_api_marker() {
        assert_eq!(classify("GET", "https://tiles.example/api/1/2/3"), Classification::TileOrCdn);
    }

    #[test]
    fn test_api_markers() {
        assert_eq!(classify("GET", "/api/settings"), Classification::ApiOnly);
        assert_eq!(classify("GET", "https://dash.local/auth/callback"), Classification::ApiOnly);
        assert_eq!(
            classify("GET", "https://router.project-osrm.org/route/v1/driving/1,2;3,4"),
            Classification::ApiOnly
        );
        assert_eq!(classify("GET", "https://graphhopper.com/api/1/route"), Classification::ApiOnly);
    }

    #[test]
    fn test_query_string_ignored_by_markers() {
        assert_eq!(classify("GET", "/styles.css?next=/api/"), Classification::DefaultStatic);
        assert_eq!(classify("GET", "/index.html?src=tile"), Classification::DefaultStatic);
    }

    #[test]
    fn test_default_static() {
        assert_eq!(classify("GET", "/styles.css"), Classification::DefaultStatic);
        assert_eq!(classify("GET", "/"), Classification::DefaultStatic);
        assert_eq!(classify("get", "https://dash.local/manifest.json"), Classification::DefaultStatic);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = classifier();
        let request = Request::get("https://tile.example/1/2/3.pbf");
        let first = c.classify_request(&request);
        for _ in 0..3 {
            assert_eq!(c.classify_request(&request), first);
        }
    }

    #[test]
    fn test_uses_cache() {
        assert!(Classification::DefaultStatic.uses_cache());
        assert!(Classification::TileOrCdn.uses_cache());
        assert!(!Classification::ApiOnly.uses_cache());
        assert!(!Classification::HostnameExcluded.uses_cache());
        assert!(!Classification::Excluded.uses_cache());
    }

    #[test]
    fn test_display() {
        assert_eq!(Classification::HostnameExcluded.to_string(), "hostname-excluded");
        assert_eq!(
            serde_json::to_string(&Classification::TileOrCdn).unwrap(),
            "\"tile-or-cdn\""
        );
    }
}
