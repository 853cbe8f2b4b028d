//! In-crate test doubles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::http_client::{Transport, UpstreamClient};

pub const BASE_URL: &str = "http://upstream.test";

#[derive(Clone)]
struct Route {
    response: Result<Value, UpstreamError>,
    delay: Duration,
}

/// Scripted transport keyed by endpoint (path plus query). Unrouted
/// endpoints answer 404. Clones share the route table and call log.
#[derive(Clone, Default)]
pub struct FakeTransport {
    routes: Arc<Mutex<HashMap<String, Route>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, endpoint: &str, body: Value) -> Self {
        self.insert(endpoint, Ok(body), Duration::ZERO)
    }

    pub fn route_delayed(self, endpoint: &str, body: Value, delay: Duration) -> Self {
        self.insert(endpoint, Ok(body), delay)
    }

    pub fn fail(self, endpoint: &str, err: UpstreamError) -> Self {
        self.insert(endpoint, Err(err), Duration::ZERO)
    }

    fn insert(self, endpoint: &str, response: Result<Value, UpstreamError>, delay: Duration) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), Route { response, delay });
        self
    }

    pub fn client(&self) -> UpstreamClient {
        UpstreamClient::with_transport(BASE_URL, self.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn lookup(&self, url: &str) -> Option<Route> {
        let routes = self.routes.lock().unwrap();
        routes
            .iter()
            .filter(|(endpoint, _)| url.ends_with(endpoint.as_str()))
            .max_by_key(|(endpoint, _)| endpoint.len())
            .map(|(_, route)| route.clone())
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get_json(&self, url: &str) -> Result<Value, UpstreamError> {
        self.calls.lock().unwrap().push(url.to_string());
        let Some(route) = self.lookup(url) else {
            return Err(UpstreamError::Status(404));
        };
        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }
        route.response
    }
}
