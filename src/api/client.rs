//! HTTP client for the forum read API
//!
//! This module handles all outbound requests, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Paging the "newest threads" and "newest replies" listings
//! - Fetching pages of a thread's posts
//! - Classifying not-found/forbidden responses apart from other failures

use crate::api::types::{DetailData, Envelope, Listing, ListingData, ListingEntry, PostPage};
use crate::api::Credentials;
use crate::config::ApiConfig;
use crate::SyncError;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Outcome of a thread detail request
#[derive(Debug)]
pub enum DetailFetch {
    /// The forum returned a page of the thread
    Page(PostPage),

    /// The forum answered not-found or forbidden
    Inaccessible {
        /// The HTTP status code
        status: u16,
    },
}

/// Client for the forum's JSON endpoints
#[derive(Debug, Clone)]
pub struct ForumClient {
    http: Client,
    base: Url,
    page_size: u32,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The API configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

impl ForumClient {
    /// Creates a client for the forum described by `config`
    pub fn new(config: &ApiConfig) -> Result<Self, SyncError> {
        let http = build_http_client(config)?;
        Self::with_http_client(http, &config.base_url, config.page_size)
    }

    /// Creates a client around an existing `reqwest::Client`
    pub fn with_http_client(http: Client, base_url: &str, page_size: u32) -> Result<Self, SyncError> {
        let mut base = Url::parse(base_url)?;

        // Endpoint paths are joined relative to the base, so keep any prefix
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http,
            base,
            page_size,
        })
    }

    /// Number of posts per detail page
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetches one page of a listing
    ///
    /// A missing list in the response is an empty page. Any non-2xx status,
    /// transport error, or undecodable body is returned as an error.
    pub async fn fetch_listing(
        &self,
        credentials: &Credentials,
        listing: Listing,
        page: u32,
    ) -> Result<Vec<ListingEntry>, SyncError> {
        let mut url = self.base.join("_/forum/toplist")?;
        url.query_pairs_mut()
            .append_pair("idlist", listing.id_list())
            .append_pair("page", &page.to_string());

        let (status, body) = self.get(credentials, url.clone()).await?;
        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let envelope: Envelope<ListingData> = decode(&url, &body)?;
        Ok(envelope.data.unwrap_or_default().into_entries(listing))
    }

    /// Fetches one page of a thread's posts together with thread metadata
    ///
    /// # Status Handling
    ///
    /// | Status | Result |
    /// |--------|--------|
    /// | 2xx | `DetailFetch::Page` |
    /// | 403, 404 | `DetailFetch::Inaccessible` |
    /// | anything else | `SyncError::HttpStatus` |
    pub async fn fetch_post_page(
        &self,
        credentials: &Credentials,
        thread_id: i64,
        page: u32,
    ) -> Result<DetailFetch, SyncError> {
        let mut url = self.base.join("_/post/list")?;
        url.query_pairs_mut()
            .append_pair("thread_id", &thread_id.to_string())
            .append_pair("page", &page.to_string())
            .append_pair("thread_details", "1");

        let (status, body) = self.get(credentials, url.clone()).await?;

        if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN {
            return Ok(DetailFetch::Inaccessible {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let envelope: Envelope<DetailData> = decode(&url, &body)?;
        Ok(DetailFetch::Page(PostPage::from_detail(
            envelope.data.unwrap_or_default(),
            thread_id,
        )))
    }

    async fn get(&self, credentials: &Credentials, url: Url) -> Result<(StatusCode, String), SyncError> {
        tracing::debug!("GET {}", url);

        let request = self
            .http
            .get(url.clone())
            .header("accept", "application/json");

        let response = credentials
            .apply(request)
            .send()
            .await
            .map_err(|source| SyncError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| SyncError::Http {
            url: url.to_string(),
            source,
        })?;

        Ok((status, body))
    }
}

fn decode<T: DeserializeOwned>(url: &Url, body: &str) -> Result<T, SyncError> {
    serde_json::from_str(body).map_err(|source| SyncError::Decode {
        url: url.to_string(),
        source,
    })
}
