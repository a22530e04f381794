//! In-memory transport for tests

use crate::surveillance::error::Result;
use crate::surveillance::utils::{HttpResponse, Transport};
use std::sync::{Arc, Mutex};

/// Returns the same canned response for every GET and records each request
#[derive(Debug, Clone)]
pub struct FakeTransport {
    response: HttpResponse,
    requests: Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>,
}

impl FakeTransport {
    pub fn ok(body: &str, last_modified: Option<&str>) -> Self {
        Self::new(HttpResponse {
            status: 200,
            body: body.to_string(),
            last_modified: last_modified.map(str::to_string),
        })
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::new(HttpResponse {
            status,
            body: body.to_string(),
            last_modified: None,
        })
    }

    fn new(response: HttpResponse) -> Self {
        Self {
            response,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), query.to_vec()));
        Ok(self.response.clone())
    }
}
