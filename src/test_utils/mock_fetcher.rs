//! In-memory [`Fetcher`] for driving the catalog and updater in tests.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use crate::core::UpgradeError;
use crate::upgrade::{FetchResponse, Fetcher};

#[derive(Debug, Clone)]
enum Route {
    Respond { status: u16, body: Vec<u8> },
    Fail(String),
}

/// A fetcher serving canned responses by exact URL.
///
/// Unknown URLs answer `404` with an empty body. Clones share their routes and
/// request log.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    routes: Arc<Mutex<HashMap<String, Route>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `status` and `body`.
    pub fn respond(self, url: &str, status: u16, body: Vec<u8>) -> Self {
        self.routes.lock().unwrap().insert(url.to_string(), Route::Respond { status, body });
        self
    }

    /// Fail requests to `url` at the transport level.
    pub fn fail(self, url: &str, reason: &str) -> Self {
        self.routes.lock().unwrap().insert(url.to_string(), Route::Fail(reason.to_string()));
        self
    }

    /// Every `(url, accept)` pair requested so far, in order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    async fn get(&self, url: &str, accept: &str) -> Result<FetchResponse, UpgradeError> {
        self.requests.lock().unwrap().push((url.to_string(), accept.to_string()));

        let route = self.routes.lock().unwrap().get(url).cloned();
        let (status, body) = match route {
            Some(Route::Respond { status, body }) => (status, body),
            Some(Route::Fail(reason)) => {
                return Err(UpgradeError::Fetch {
                    url: url.to_string(),
                    reason,
                });
            }
            None => (404, Vec::new()),
        };

        Ok(FetchResponse {
            url: url.to_string(),
            status,
            body: Box::new(Cursor::new(body)),
        })
    }
}
