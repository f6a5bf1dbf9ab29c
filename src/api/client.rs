//! HTTP client for the photo search API
//!
//! Wraps the curated, search, single-photo and cursor endpoints plus
//! the plain image downloads, using [`reqwest`].

use bytes::Bytes;
use reqwest::header::AUTHORIZATION;
use reqwest::Url;

use crate::config::Config;
use crate::error::{GalleryError, Result};
use crate::state::data::{Photo, PhotoId, PhotoPage};
use crate::state::pagination::{PageQuery, PageRequest};

/// Client for a Pexels-compatible photo API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    pub fn with_client(client: reqwest::Client, config: &Config) -> Self {
        ApiClient {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Resolve the URL of a list request
    pub fn page_url(&self, request: &PageRequest) -> Result<Url> {
        let per_page = request.per_page.to_string();
        let parsed = match &request.query {
            PageQuery::Curated => Url::parse_with_params(
                &format!("{}/curated", self.api_base),
                &[("per_page", per_page.as_str())],
            ),
            PageQuery::Search(query) => Url::parse_with_params(
                &format!("{}/search", self.api_base),
                &[("query", query.as_str()), ("per_page", per_page.as_str())],
            ),
            // Cursors are complete URLs supplied by the API
            PageQuery::Cursor(cursor) => Url::parse(cursor),
        };
        parsed.map_err(|err| GalleryError::Config(format!("invalid API URL: {err}")))
    }

    pub fn photo_url(&self, id: PhotoId) -> Result<Url> {
        Url::parse(&format!("{}/photos/{}", self.api_base, id))
            .map_err(|err| GalleryError::Config(format!("invalid API URL: {err}")))
    }

    /// Fetch one page of photos
    pub async fn fetch_page(&self, request: &PageRequest) -> Result<PhotoPage> {
        let operation = request.operation();
        let url = self.page_url(request)?;
        tracing::debug!(%url, "GET page");
        self.get_json(operation, url).await
    }

    /// Fetch a single photo record
    pub async fn fetch_photo(&self, id: PhotoId) -> Result<Photo> {
        let url = self.photo_url(id)?;
        tracing::debug!(%url, "GET photo");
        self.get_json("fetch the photo", url).await
    }

    /// Download image bytes. No authorization is sent to image hosts.
    pub async fn fetch_image(&self, url: &str) -> Result<Bytes> {
        const OPERATION: &str = "fetch image";

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| GalleryError::from_reqwest(OPERATION, err))?;
        let response = Self::ensure_success(OPERATION, response)?;
        response
            .bytes()
            .await
            .map_err(|err| GalleryError::from_reqwest(OPERATION, err))
    }

    // ---- private helpers ----

    async fn get_json<T: serde::de::DeserializeOwned>(&self, operation: &str, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, &self.api_key)
            .send()
            .await
            .map_err(|err| GalleryError::from_reqwest(operation, err))?;
        let response = Self::ensure_success(operation, response)?;
        let body = response
            .bytes()
            .await
            .map_err(|err| GalleryError::from_reqwest(operation, err))?;

        serde_json::from_slice(&body).map_err(|err| GalleryError::Decode {
            operation: operation.to_string(),
            message: err.to_string(),
        })
    }

    fn ensure_success(operation: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            return Err(GalleryError::Api {
                operation: operation.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}
