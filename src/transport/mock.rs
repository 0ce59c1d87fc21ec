//! Scripted transport for tests

use super::{Method, Request, Response, Transport, TransportError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type Outcome = Result<Response, TransportError>;

/// Transport that answers from a script and records every request.
///
/// Each (method, url) pair holds a queue of outcomes. The last queued outcome
/// repeats once the queue drains. Unscripted requests get a bare 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<HashMap<(Method, String), VecDeque<Outcome>>>,
    log: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, url: &str, outcome: Outcome) {
        if let Ok(mut script) = self.script.lock() {
            script
                .entry((method, url.to_string()))
                .or_default()
                .push_back(outcome);
        }
    }

    /// Queue a response with a raw body
    pub fn respond(&self, method: Method, url: &str, status: u16, body: Option<&str>) -> &Self {
        self.push(method, url, Ok(Response::new(status, body.map(str::to_string))));
        self
    }

    /// Queue a response with a JSON body
    pub fn respond_json(&self, method: Method, url: &str, status: u16, body: serde_json::Value) -> &Self {
        self.push(method, url, Ok(Response::new(status, Some(body.to_string()))));
        self
    }

    /// Queue a network failure
    pub fn unreachable(&self, method: Method, url: &str) -> &Self {
        self.push(method, url, Err(TransportError("connection refused".to_string())));
        self
    }

    /// Every request executed so far, in order
    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// URLs of every request executed so far, in order
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let key = (request.method, request.url.clone());
        if let Ok(mut log) = self.log.lock() {
            log.push(request);
        }

        let mut script = self
            .script
            .lock()
            .map_err(|_| TransportError("mock script poisoned".to_string()))?;

        match script.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Ok(Response::new(404, None))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(Response::new(404, None))),
            None => Ok(Response::new(404, None)),
        }
    }
}
