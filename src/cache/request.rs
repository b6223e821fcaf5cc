//! Request and Response Module
//!
//! Defines the intercepted request, the response a strategy produces, and the
//! key under which a response is stored in a partition.

use std::fmt;

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};
use url::Url;

/// Body of the placeholder returned for an uncached static asset while offline.
pub const OFFLINE_CONTENT_BODY: &str = "Offline content not available";

// == Fetch Request ==
/// An intercepted request, as seen by the classifier and the strategies.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchRequest {
    /// Creates a request with no headers and an empty body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Shorthand for a bodiless GET.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Returns the partition key for this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::from_url(&self.url)
    }

    /// Returns the partition key scoped to the caller's credentials.
    ///
    /// Requests carrying `authorization` or `cookie` get a key that also
    /// holds a digest of those headers, so one caller never reads another
    /// caller's entry. Anonymous requests get the plain URL key.
    pub fn credential_key(&self) -> RequestKey {
        let mut hasher = Sha256::new();
        let mut scoped = false;
        for name in [header::AUTHORIZATION, header::COOKIE] {
            for value in self.headers.get_all(&name) {
                hasher.update(name.as_str().as_bytes());
                hasher.update(b":");
                hasher.update(value.as_bytes());
                hasher.update(b"\n");
                scoped = true;
            }
        }

        if scoped {
            RequestKey::scoped(&self.url, &hex::encode(hasher.finalize()))
        } else {
            self.key()
        }
    }
}

// == Fetch Response ==
/// A response returned to the caller and, when cacheable, stored in a partition.
///
/// The body is reference counted, so cloning a response to store it costs
/// no copy of the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchResponse {
    /// Creates a response with the given status and body and no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Returns the response with an extra header. Invalid values are dropped.
    pub fn with_header(mut self, name: header::HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// True when the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// True when the response may be written to a partition: any 2xx
    /// except `206 Partial Content`.
    pub fn is_cacheable(&self) -> bool {
        self.is_success() && self.status != StatusCode::PARTIAL_CONTENT
    }

    /// Placeholder served for a static asset that is neither cached nor reachable.
    pub fn offline_placeholder() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, OFFLINE_CONTENT_BODY)
    }

    /// Structured failure served for API and default routes while offline.
    pub fn offline_json(message: &str) -> Self {
        let body = json!({
            "success": false,
            "message": message,
            "offline": true,
        });

        Self::new(StatusCode::SERVICE_UNAVAILABLE, body.to_string())
            .with_header(header::CONTENT_TYPE, "application/json")
    }

    /// Parses the `date` header set by the origin.
    ///
    /// Returns `None` when the header is missing or not a valid HTTP date.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        let raw = self.headers.get(header::DATE)?.to_str().ok()?;
        DateTime::parse_from_rfc2822(raw)
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }
}

// == Request Key ==
/// Partition key: the request URL without its fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn from_url(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self(url.into())
    }

    /// Key for a URL seen through one set of credentials. The fragment
    /// slot is free once stripped, so it carries the digest.
    fn scoped(url: &Url, digest: &str) -> Self {
        let mut url = url.clone();
        url.set_fragment(Some(&format!("credential={}", digest)));
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
