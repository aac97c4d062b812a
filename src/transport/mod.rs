//! Credentialed request transport.
//!
//! The workflow only sees [`Transport`]: a request goes in, a status and a
//! body come out. Status interpretation lives in [`crate::api`].

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use thiserror::Error;

mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use http::HttpTransport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("Could not encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    /// Raw values appended to `path` as percent-encoded segments
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            segments: Vec::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, TransportError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    /// Append one path segment. The transport encodes it, so `/`, `#` or
    /// `?` in a scanned identifier stay part of the segment.
    pub fn segment(mut self, value: &str) -> Self {
        self.segments.push(value.to_string());
        self
    }

    /// Path with its segments, unencoded, for logs and assertions
    pub fn full_path(&self) -> String {
        std::iter::once(self.path.trim_end_matches('/'))
            .chain(self.segments.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Add a query parameter, skipping blank values
    pub fn query_opt(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.query.push((key.to_string(), v.to_string()));
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_query_values_are_skipped() {
        let request = ApiRequest::get("/consultation")
            .query_opt("client", Some("  "))
            .query_opt("article", None)
            .query_opt("num_palette", Some(" P1 "));

        assert_eq!(
            request.query,
            vec![("num_palette".to_string(), "P1".to_string())]
        );
    }

    #[test]
    fn test_segments_are_kept_apart_from_the_path() {
        let request = ApiRequest::get("/entree/palette").segment("PAL#0042");
        assert_eq!(request.path, "/entree/palette");
        assert_eq!(request.segments, vec!["PAL#0042".to_string()]);
        assert_eq!(request.full_path(), "/entree/palette/PAL#0042");
    }

    #[test]
    fn test_success_range() {
        let ok = ApiResponse { status: 204, body: String::new() };
        let rejected = ApiResponse { status: 409, body: String::new() };
        assert!(ok.is_success());
        assert!(!rejected.is_success());
    }
}
