//! Fetch strategies.
//!
//! | Class                               | Strategy      | Partition |
//! |-------------------------------------|---------------|-----------|
//! | `default-static`                    | cache-first   | precache  |
//! | `tile-or-cdn`                       | network-first | runtime   |
//! | `api-only`, `hostname-excluded`, `excluded` | network-only | none |
//!
//! Only network-only requests can fail; the cached strategies always produce
//! a response, synthesizing a `503` when neither source has one. A store
//! failure never fails a request: reads degrade to a miss and writes are
//! dropped after a warning.

use std::sync::Arc;

use cardash_core::{CacheDb, Error, Request, Response};
use serde::{Deserialize, Serialize};

use crate::classify::{Classification, Classifier};
use crate::config::WorkerConfig;
use crate::fetch::Network;

const OFFLINE_BODY: &str = "Offline - resource not available";
const NETWORK_ERROR_BODY: &str = "Network error";

/// Documents tried, in order, when an HTML navigation fails offline.
const FALLBACK_DOCUMENTS: &[&str] = &["/index.html", "/"];

/// Where an intercepted request's response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    ServedFromCache,
    ServedFromNetwork,
    /// Generated locally because no source could answer.
    Synthetic,
}

/// Per-request record of how a request was routed. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptRecord {
    pub method: String,
    pub url: String,
    pub classification: Classification,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub response: Response,
    pub record: InterceptRecord,
}

impl FetchResult {
    fn new(request: Request, classification: Classification, response: Response, outcome: Outcome) -> Self {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            classification = %classification,
            outcome = ?outcome,
            status = response.status,
            "intercepted request"
        );
        Self { response, record: InterceptRecord { method: request.method, url: request.url, classification, outcome } }
    }
}

/// Routes classified requests to the matching strategy.
pub struct StrategyEngine {
    db: CacheDb,
    network: Arc<dyn Network>,
    classifier: Classifier,
    precache_name: String,
    runtime_name: String,
}

impl StrategyEngine {
    pub fn new(db: CacheDb, network: Arc<dyn Network>, config: &WorkerConfig) -> Self {
        Self {
            db,
            network,
            classifier: Classifier::new(config.origin.clone(), config.rules.clone()),
            precache_name: config.precache_name.clone(),
            runtime_name: config.runtime_name.clone(),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classify `request` and resolve it through its strategy.
    ///
    /// # Errors
    ///
    /// Only network-only requests return an error: the network failure,
    /// unmodified.
    pub async fn handle(&self, request: &Request) -> Result<FetchResult, Error> {
        let (classification, request) = self.resolve(request);

        let (response, outcome) = match classification {
            Classification::DefaultStatic => self.cache_first(&request).await,
            Classification::TileOrCdn => self.network_first(&request).await,
            Classification::ApiOnly | Classification::HostnameExcluded | Classification::Excluded => {
                self.network_only(&request).await?
            }
        };

        Ok(FetchResult::new(request, classification, response, outcome))
    }

    /// Send `request` to the network without consulting any partition.
    ///
    /// Used while no activated worker controls the page.
    pub async fn passthrough(&self, request: &Request) -> Result<FetchResult, Error> {
        let (classification, request) = self.resolve(request);
        let (response, outcome) = self.network_only(&request).await?;
        Ok(FetchResult::new(request, classification, response, outcome))
    }

    fn resolve(&self, request: &Request) -> (Classification, Request) {
        let (classification, url) = self.classifier.classify_request(request);
        let request = match url {
            Some(url) => Request { url: url.into(), ..request.clone() },
            None => request.clone(),
        };
        (classification, request)
    }

    async fn cache_first(&self, request: &Request) -> (Response, Outcome) {
        if let Some(cached) = self.lookup(&self.precache_name, request).await {
            tracing::debug!("serving from cache: {}", request.url);
            return (cached, Outcome::ServedFromCache);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store(&self.precache_name, request, &response).await;
                }
                (response, Outcome::ServedFromNetwork)
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "fetch failed, serving offline response");

                if request.accepts_html()
                    && let Some(document) = self.fallback_document().await
                {
                    return (document, Outcome::ServedFromCache);
                }

                (Response::service_unavailable(OFFLINE_BODY), Outcome::Synthetic)
            }
        }
    }

    async fn network_first(&self, request: &Request) -> (Response, Outcome) {
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store(&self.runtime_name, request, &response).await;
                }
                (response, Outcome::ServedFromNetwork)
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "network failed, trying runtime cache");

                match self.lookup(&self.runtime_name, request).await {
                    Some(cached) => (cached, Outcome::ServedFromCache),
                    None => {
                        tracing::warn!(url = %request.url, "no cached response available");
                        (Response::service_unavailable(NETWORK_ERROR_BODY), Outcome::Synthetic)
                    }
                }
            }
        }
    }

    async fn network_only(&self, request: &Request) -> Result<(Response, Outcome), Error> {
        let response = self.network.fetch(request).await?;
        Ok((response, Outcome::ServedFromNetwork))
    }

    /// App-shell document for an offline navigation, searched across every
    /// partition.
    async fn fallback_document(&self) -> Option<Response> {
        for path in FALLBACK_DOCUMENTS {
            let Ok(url) = self.classifier.origin().join(path) else {
                continue;
            };
            match self.db.match_any(&Request::get(url)).await {
                Ok(Some(document)) => return Some(document),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(%path, error = %e, "cache read failed, no fallback document");
                    return None;
                }
            }
        }
        None
    }

    async fn lookup(&self, partition: &str, request: &Request) -> Option<Response> {
        match self.db.match_request(partition, request).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(partition, url = %request.url, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    async fn store(&self, partition: &str, request: &Request, response: &Response) {
        if let Err(e) = self.db.put(partition, request, response).await {
            tracing::warn!(partition, url = %request.url, error = %e, "failed to cache response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubNetwork;
    use cardash_core::AppConfig;

    const ORIGIN: &str = "https://dash.local";
    const TILE: &str = "https://tile.example/1/2/3.pbf";

    struct Harness {
        db: CacheDb,
        network: Arc<StubNetwork>,
        engine: StrategyEngine,
    }

    async fn harness() -> Harness {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(StubNetwork::new());
        let app = AppConfig { origin: ORIGIN.into(), ..Default::default() };
        let config = WorkerConfig::from_app_config(&app).unwrap();
        let engine = StrategyEngine::new(db.clone(), network.clone(), &config);
        Harness { db, network, engine }
    }

    fn css() -> Response {
        Response::new(200, "body{}").with_header("content-type", "text/css")
    }

    #[tokio::test]
    async fn test_cache_first_stores_and_serves_offline() {
        let h = harness().await;
        h.network.route("https://dash.local/styles.css", css());

        let first = h.engine.handle(&Request::get("/styles.css")).await.unwrap();
        assert_eq!(first.response.status, 200);
        assert_eq!(first.response.text(), "body{}");
        assert_eq!(first.record.outcome, Outcome::ServedFromNetwork);
        assert_eq!(first.record.classification, Classification::DefaultStatic);
        assert_eq!(first.record.url, "https://dash.local/styles.css");

        h.network.set_offline(true);
        let second = h.engine.handle(&Request::get("/styles.css")).await.unwrap();
        assert_eq!(second.response.status, 200);
        assert_eq!(second.response.body, first.response.body);
        assert_eq!(second.record.outcome, Outcome::ServedFromCache);
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let h = harness().await;
        h.db.put("cardash-v1", &Request::get("https://dash.local/app.js"), &Response::new(200, "cached"))
            .await
            .unwrap();

        let result = h.engine.handle(&Request::get("/app.js")).await.unwrap();
        assert_eq!(result.response.text(), "cached");
        assert!(h.network.requests().is_empty());
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_non_ok() {
        let h = harness().await;

        let result = h.engine.handle(&Request::get("/missing.js")).await.unwrap();
        assert_eq!(result.response.status, 404);
        assert_eq!(result.record.outcome, Outcome::ServedFromNetwork);
        assert!(
            h.db.match_request("cardash-v1", &Request::get("https://dash.local/missing.js"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_cache_first_offline_synthetic() {
        let h = harness().await;
        h.network.set_offline(true);

        let result = h.engine.handle(&Request::get("/styles.css")).await.unwrap();
        assert_eq!(result.response.status, 503);
        assert_eq!(result.response.text(), OFFLINE_BODY);
        assert_eq!(result.response.content_type(), Some("text/plain"));
        assert_eq!(result.record.outcome, Outcome::Synthetic);
    }

    #[tokio::test]
    async fn test_navigation_falls_back_to_app_shell() {
        let h = harness().await;
        h.db.put(
            "cardash-v1",
            &Request::get("https://dash.local/index.html"),
            &Response::new(200, "<html>shell</html>"),
        )
        .await
        .unwrap();
        h.network.set_offline(true);

        let nav = Request::get("/maps.html").with_header("Accept", "text/html,application/xhtml+xml");
        let result = h.engine.handle(&nav).await.unwrap();
        assert_eq!(result.response.status, 200);
        assert_eq!(result.response.text(), "<html>shell</html>");
        assert_eq!(result.record.outcome, Outcome::ServedFromCache);

        let asset = Request::get("/maps.css").with_header("Accept", "text/css");
        let result = h.engine.handle(&asset).await.unwrap();
        assert_eq!(result.response.status, 503);
    }

    #[tokio::test]
    async fn test_navigation_fallback_searches_all_partitions() {
        let h = harness().await;
        h.db.put(
            "cardash-runtime-v1",
            &Request::get("https://dash.local/"),
            &Response::new(200, "<html>root</html>"),
        )
        .await
        .unwrap();
        h.network.set_offline(true);

        let nav = Request::get("/telegram.html").with_header("Accept", "text/html");
        let result = h.engine.handle(&nav).await.unwrap();
        assert_eq!(result.response.status, 200);
        assert_eq!(result.response.text(), "<html>root</html>");
        assert_eq!(result.record.outcome, Outcome::ServedFromCache);
    }

    #[tokio::test]
    async fn test_navigation_without_shell_is_synthetic() {
        let h = harness().await;
        h.network.set_offline(true);

        let nav = Request::get("/settings.html").with_header("Accept", "text/html");
        let result = h.engine.handle(&nav).await.unwrap();
        assert_eq!(result.response.status, 503);
        assert_eq!(result.record.outcome, Outcome::Synthetic);
    }

    #[tokio::test]
    async fn test_network_first_unreachable_without_cache_is_503() {
        let h = harness().await;
        h.network.set_offline(true);

        let result = h.engine.handle(&Request::get(TILE)).await.unwrap();
        assert_eq!(result.record.classification, Classification::TileOrCdn);
        assert_eq!(result.response.status, 503);
        assert_eq!(result.response.text(), NETWORK_ERROR_BODY);
        assert_eq!(result.record.outcome, Outcome::Synthetic);
    }

    #[tokio::test]
    async fn test_network_first_prefers_network_and_falls_back() {
        let h = harness().await;
        h.network.route(TILE, Response::new(200, "tile-v1"));

        let online = h.engine.handle(&Request::get(TILE)).await.unwrap();
        assert_eq!(online.response.text(), "tile-v1");
        assert!(h.db.has_partition("cardash-runtime-v1").await.unwrap());

        h.network.route(TILE, Response::new(200, "tile-v2"));
        let refreshed = h.engine.handle(&Request::get(TILE)).await.unwrap();
        assert_eq!(refreshed.response.text(), "tile-v2");
        assert_eq!(refreshed.record.outcome, Outcome::ServedFromNetwork);

        h.network.set_offline(true);
        let offline = h.engine.handle(&Request::get(TILE)).await.unwrap();
        assert_eq!(offline.response.text(), "tile-v2");
        assert_eq!(offline.record.outcome, Outcome::ServedFromCache);
    }

    #[tokio::test]
    async fn test_network_first_does_not_touch_precache() {
        let h = harness().await;
        h.network.route(TILE, Response::new(200, "tile"));
        h.engine.handle(&Request::get(TILE)).await.unwrap();

        assert!(h.db.match_request("cardash-v1", &Request::get(TILE)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_network_only_never_touches_partitions() {
        let h = harness().await;
        let api = "https://dash.local/api/settings";
        let spotify = "https://api.spotify.com/v1/me";
        h.network.route(api, Response::new(200, "{\"theme\":\"dark\"}"));
        h.network.route(spotify, Response::new(401, "unauthorized"));

        let result = h.engine.handle(&Request::get(api)).await.unwrap();
        assert_eq!(result.record.classification, Classification::ApiOnly);
        assert_eq!(result.response.text(), "{\"theme\":\"dark\"}");

        let result = h.engine.handle(&Request::get(spotify)).await.unwrap();
        assert_eq!(result.record.classification, Classification::HostnameExcluded);
        assert_eq!(result.response.status, 401);

        assert!(h.db.list_partition_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_network_only_failure_propagates() {
        let h = harness().await;
        h.db.put(
            "cardash-v1",
            &Request::get("https://dash.local/api/settings"),
            &Response::new(200, "stale"),
        )
        .await
        .unwrap();
        h.network.set_offline(true);

        let result = h.engine.handle(&Request::get("/api/settings")).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_non_get_passes_through() {
        let h = harness().await;
        h.network.route("https://dash.local/styles.css", css());

        let result = h.engine.handle(&Request::new("POST", "/styles.css")).await.unwrap();
        assert_eq!(result.record.classification, Classification::Excluded);
        assert!(h.db.list_partition_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_still_serves() {
        let h = harness().await;
        h.network.route("https://dash.local/styles.css", css());
        h.db.clone().close().await.unwrap();

        let result = h.engine.handle(&Request::get("/styles.css")).await.unwrap();
        assert_eq!(result.response.status, 200);
        assert_eq!(result.response.text(), "body{}");
        assert_eq!(result.record.outcome, Outcome::ServedFromNetwork);

        h.network.set_offline(true);
        let result = h.engine.handle(&Request::get(TILE)).await.unwrap();
        assert_eq!(result.response.status, 503);
    }

    #[tokio::test]
    async fn test_passthrough_skips_cache() {
        let h = harness().await;
        h.db.put("cardash-v1", &Request::get("https://dash.local/app.js"), &Response::new(200, "cached"))
            .await
            .unwrap();
        h.network.route("https://dash.local/app.js", Response::new(200, "fresh"));

        let result = h.engine.passthrough(&Request::get("/app.js")).await.unwrap();
        assert_eq!(result.response.text(), "fresh");
        assert_eq!(result.record.outcome, Outcome::ServedFromNetwork);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let h = harness().await;
        for i in 0..8 {
            h.network.route(&format!("https://dash.local/asset-{i}.js"), Response::new(200, format!("a{i}")));
        }

        let requests: Vec<Request> = (0..8).map(|i| Request::get(format!("/asset-{i}.js"))).collect();
        let results = futures_util::future::join_all(requests.iter().map(|r| h.engine.handle(r))).await;

        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap().response.text(), format!("a{i}"));
        }
        let stats = h.db.partition_stats().await.unwrap();
        assert_eq!(stats[0].entries, 8);
    }
}
