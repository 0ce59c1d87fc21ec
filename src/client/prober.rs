//! Endpoint prober
//!
//! Tries the candidate paths of a [`LogicalRead`] strictly in order and
//! accepts the first response that carries a parseable body, even an empty
//! one. Candidates are never raced: a 404 on one path has to be seen before
//! the next path is worth asking.
//!
//! Outcomes:
//! - 2xx with a JSON body → [`Probed`]
//! - 401/403 → [`ClientError::Unauthorized`] immediately, no further attempts
//! - any other status, or 2xx without a usable body → next candidate
//! - network failure on one candidate → next candidate
//! - nothing left → [`ClientError::Exhausted`] with the last status seen, or
//!   [`ClientError::Transport`] if no candidate reached the server at all

use super::routes::LogicalRead;
use crate::config::ClientConfig;
use crate::error::{ClientError, ErrorKind, Result};
use crate::transport::{Request, Transport};
use tracing::{debug, warn};

/// First plausible response for a logical read
#[derive(Debug, Clone, PartialEq)]
pub struct Probed {
    /// The candidate path that answered
    pub path: String,
    pub body: serde_json::Value,
}

pub struct EndpointProber<T> {
    config: ClientConfig,
    transport: T,
}

impl<T: Transport> EndpointProber<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Probe every candidate of `read` with `params` substituted
    pub async fn probe(
        &self,
        read: &LogicalRead,
        params: &[(&str, &str)],
        auth_token: Option<&str>,
    ) -> Result<Probed> {
        let candidates = read.render(params);
        self.probe_paths(read.name, &candidates, auth_token).await
    }

    /// Probe an explicit ordered list of paths
    pub async fn probe_paths(
        &self,
        operation: &str,
        candidates: &[String],
        auth_token: Option<&str>,
    ) -> Result<Probed> {
        let mut last_status = None;
        let mut last_transport_error = None;
        let mut attempts = 0;

        for path in candidates {
            attempts += 1;
            let request = Request::get(self.config.url_for(path)).with_bearer(auth_token);

            let response = match self.transport.execute(request).await {
                Ok(response) => response,
                Err(e) => {
                    debug!(operation, path = %path, error = %e, "Candidate unreachable, trying next");
                    last_transport_error = Some(e);
                    continue;
                }
            };

            if response.is_auth_rejection() {
                warn!(operation, path = %path, status = response.status, "Probe rejected credentials");
                return Err(ClientError::Unauthorized {
                    status: response.status,
                });
            }

            if response.is_success() {
                if let Some(body) = response.json() {
                    debug!(operation, path = %path, status = response.status, "Probe succeeded");
                    return Ok(Probed {
                        path: path.clone(),
                        body,
                    });
                }
                debug!(operation, path = %path, status = response.status, "Success without a usable body, trying next");
            } else {
                debug!(
                    operation,
                    path = %path,
                    status = response.status,
                    kind = %ErrorKind::from_status(response.status),
                    "Candidate failed, trying next"
                );
            }
            last_status = Some(response.status);
        }

        match (last_status, last_transport_error) {
            (None, Some(e)) => Err(ClientError::Transport(e.to_string())),
            (last_status, _) => {
                warn!(operation, attempts, ?last_status, "All candidates exhausted");
                Err(ClientError::Exhausted {
                    operation: operation.to_string(),
                    last_status,
                    attempts,
                })
            }
        }
    }
}
