//! Scoped HTTP client bound to one base endpoint
//!
//! Uses ureq for synchronous HTTP requests. Error statuses come back as
//! ordinary responses so the contract layer can judge them.

use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("{method} {path} failed: {message}")]
    Transport {
        method: &'static str,
        path: String,
        message: String,
    },

    #[error("Failed to read response body of {method} {path}: {source}")]
    Body {
        method: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Write operations on a single resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Update,
    Delete,
}

/// A fully received HTTP response plus timing metadata
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub method: &'static str,
    pub path: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    pub elapsed: Duration,
}

impl ApiResponse {
    /// Whether the status is in the 2xx range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Request line, e.g. `GET /comments/1`
    pub fn request_line(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

impl fmt::Display for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} response status: {} ({} ms)",
            self.request_line(),
            self.status,
            self.elapsed.as_millis()
        )
    }
}

/// HTTP client for one backend; dropping it releases the connection pool
pub struct ResourceClient {
    agent: ureq::Agent,
    base_url: String,
}

impl ResourceClient {
    /// Build a client for `base_url` with a per-request timeout
    pub fn acquire(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("crudcheck/", env!("CARGO_PKG_VERSION")))
            .build();

        Ok(Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Run `f` with a freshly acquired client.
    ///
    /// The client lives only for the closure; it is released on return and
    /// while unwinding from a panic.
    pub fn scoped<T, F>(base_url: &str, timeout: Duration, f: F) -> Result<T, ClientError>
    where
        F: FnOnce(&ResourceClient) -> T,
    {
        let client = Self::acquire(base_url, timeout)?;
        Ok(f(&client))
    }

    /// GET a collection, optionally filtered server-side by equality params
    pub fn list(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse, ClientError> {
        let mut display = path.to_string();
        if !query.is_empty() {
            let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            display = format!("{}?{}", path, pairs.join("&"));
        }

        let mut request = self.agent.get(&self.url(path));
        for (key, value) in query {
            request = request.query(key, value);
        }
        self.send("GET", display, || request.call())
    }

    /// GET a single resource
    pub fn get(&self, path: &str, id: &str) -> Result<ApiResponse, ClientError> {
        let item = item_path(path, id);
        let request = self.agent.get(&self.url(&item));
        self.send("GET", item, || request.call())
    }

    /// POST a new resource
    pub fn create(&self, path: &str, payload: &Value) -> Result<ApiResponse, ClientError> {
        let request = self.agent.post(&self.url(path));
        self.send("POST", path.to_string(), || request.send_json(payload))
    }

    /// PUT or DELETE a single resource; `payload` is ignored for deletes
    pub fn mutate(
        &self,
        path: &str,
        id: &str,
        payload: &Value,
        mutation: Mutation,
    ) -> Result<ApiResponse, ClientError> {
        let item = item_path(path, id);
        match mutation {
            Mutation::Update => {
                let request = self.agent.put(&self.url(&item));
                self.send("PUT", item, || request.send_json(payload))
            }
            Mutation::Delete => {
                let request = self.agent.delete(&self.url(&item));
                self.send("DELETE", item, || request.call())
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send<F>(&self, method: &'static str, path: String, call: F) -> Result<ApiResponse, ClientError>
    where
        F: FnOnce() -> Result<ureq::Response, ureq::Error>,
    {
        let started = Instant::now();

        let response = match call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(ClientError::Transport {
                    method,
                    path,
                    message: transport.to_string(),
                })
            }
        };

        let status = response.status();
        let content_type = response.header("content-type").map(|s| s.to_string());
        let body = match response.into_string() {
            Ok(body) => body,
            Err(source) => return Err(ClientError::Body { method, path, source }),
        };

        Ok(ApiResponse {
            method,
            path,
            status,
            content_type,
            body,
            elapsed: started.elapsed(),
        })
    }
}

/// Join a collection path and an id: `/comments` + `1` -> `/comments/1`
pub fn item_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection.trim_end_matches('/'), id)
}
