//! Scriptable in-process network for strategy and lifecycle tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use cardash_core::{Error, Request, Response};

use crate::fetch::Network;

/// Serves canned responses by absolute URL; unknown URLs get a 404.
#[derive(Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, Response>>,
    unreachable: Mutex<HashSet<String>>,
    offline: AtomicBool,
    requests: Mutex<Vec<String>>,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    /// Make a single URL fail with a network error.
    pub fn unreachable(&self, url: &str) {
        self.unreachable.lock().unwrap().insert(url.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.requests.lock().unwrap().push(request.url.clone());

        if self.offline.load(Ordering::SeqCst) || self.unreachable.lock().unwrap().contains(&request.url) {
            return Err(Error::Network(format!("{}: connection refused", request.url)));
        }

        let response = self.routes.lock().unwrap().get(&request.url).cloned();
        Ok(response.unwrap_or_else(|| Response::new(404, "not found").with_status_text("Not Found")))
    }
}
