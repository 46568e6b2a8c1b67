//! Remote blob-service status store.
//!
//! Talks to an external key-value service over HTTP. Records are namespaced
//! by site and store name:
//!
//! ```text
//! PUT  {base_url}/{site_id}/{store_name}/{key}     store a record (JSON body)
//! GET  {base_url}/{site_id}/{store_name}/{key}     200 record | 404
//! GET  {base_url}/{site_id}/{store_name}?cursor=c  {"blobs":[{"key":..}],"next_cursor":..}
//! ```
//!
//! Requests carry `Authorization: Bearer <token>` when a token is configured.
//! A cursor handed out twice in one listing ends it with a backend error.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use kioskwatch_core::store::Result;
use kioskwatch_core::{
    BackendKind, DeviceKey, StatusRecord, StatusStore, StatusStream, StoreConfig, StoreError,
};

/// One page of the key listing.
#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    blobs: Vec<BlobEntry>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlobEntry {
    key: String,
}

/// Map transport failures onto the store taxonomy.
fn transport_err(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout(e.to_string())
    } else if e.is_connect() || e.is_request() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Backend(e.to_string())
    }
}

/// HTTP client for a remote blob store.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: Client,
    /// `{base_url}/{site_id}/{store_name}`, no trailing slash.
    store_url: String,
    token: Option<String>,
}

impl RemoteStore {
    pub fn new(
        base_url: &str,
        site_id: &str,
        store_name: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let store_url = format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(site_id),
            urlencoding::encode(store_name)
        );

        Ok(Self {
            client,
            store_url,
            token,
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                StoreError::Configuration("Remote backend requires a base URL".to_string())
            })?;
        Self::new(
            base_url,
            &config.site_id,
            &config.store_name,
            config.token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn store_url(&self) -> &str {
        &self.store_url
    }

    fn key_url(&self, key: &str) -> String {
        format!("{}/{}", self.store_url, urlencoding::encode(key))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch(&self, key: &str) -> Result<Option<StatusRecord>> {
        let response = self
            .authorize(self.client.get(self.key_url(key)))
            .send()
            .await
            .map_err(transport_err)?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                return Err(StoreError::Backend(format!("GET {} returned {}", key, status)));
            }
            _ => {}
        }

        let bytes = response.bytes().await.map_err(transport_err)?;
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::corrupt(key, e))
    }

    async fn list_page(&self, cursor: Option<&str>) -> Result<ListPage> {
        let mut request = self.client.get(&self.store_url);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = self.authorize(request).send().await.map_err(transport_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Backend(format!("List returned {}", status)));
        }

        let bytes = response.bytes().await.map_err(transport_err)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Backend(format!("Malformed listing: {}", e)))
    }
}

#[async_trait]
impl StatusStore for RemoteStore {
    async fn put(&self, key: &DeviceKey, record: &StatusRecord) -> Result<()> {
        let response = self
            .authorize(self.client.put(self.key_url(key.as_str())))
            .json(record)
            .send()
            .await
            .map_err(transport_err)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(StoreError::Backend(format!("PUT {} returned {}", key, status)))
        }
    }

    async fn get(&self, key: &DeviceKey) -> Result<Option<StatusRecord>> {
        self.fetch(key.as_str()).await
    }

    fn list(&self) -> StatusStream<'_> {
        async_stream::stream! {
            let mut seen = HashSet::new();
            let mut visited = HashSet::new();
            let mut cursor: Option<String> = None;

            loop {
                let page = match self.list_page(cursor.as_deref()).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };

                for blob in page.blobs {
                    if !seen.insert(blob.key.clone()) {
                        continue;
                    }
                    match self.fetch(&blob.key).await {
                        Ok(Some(record)) => {
                            yield Ok((DeviceKey::new(blob.key), record));
                        }
                        // Deleted between listing and fetch.
                        Ok(None) => continue,
                        Err(e) if e.is_record_local() => {
                            yield Err(e);
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }

                match page.next_cursor {
                    Some(next) if !next.is_empty() => {
                        if !visited.insert(next.clone()) {
                            yield Err(StoreError::Backend(format!(
                                "Cursor cycle in listing at {}",
                                next
                            )));
                            return;
                        }
                        cursor = Some(next);
                    }
                    _ => break,
                }
            }
        }
        .boxed()
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn is_persistent(&self) -> bool {
        true
    }
}
