//! Network Module
//!
//! The seam through which every strategy reaches the network.

use async_trait::async_trait;
use axum::http::header;

use crate::cache::{FetchRequest, FetchResponse};
use crate::error::{CacheError, Result};

/// Performs network fetches on behalf of the strategies.
///
/// An `Err` means no response arrived at all. Any HTTP status, including
/// 4xx and 5xx, is an `Ok`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

// == HTTP Fetcher ==
/// Fetcher backed by a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let mut headers = request.headers.clone();
        for name in [
            header::HOST,
            header::CONTENT_LENGTH,
            header::CONNECTION,
            header::TRANSFER_ENCODING,
        ] {
            headers.remove(name);
        }

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| CacheError::Network(format!("{} {}: {}", request.method, request.url, e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| CacheError::Network(format!("reading body of {}: {}", request.url, e)))?;

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}
