// Blob storage HTTP client
//
// Objects live under `/storage/v1/object/{bucket}/{path}`; public objects
// are served from `/storage/v1/object/public/{bucket}/{path}`. The public
// URL therefore embeds the object path, which is what makes
// `path_from_url` reversible.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::gateway::BlobStorage;
use crate::transport::TransportConfig;

/// Storage error envelope: `{"statusCode": "404", "error": "...", "message": "..."}`.
#[derive(Deserialize)]
struct StorageErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Async client for one storage bucket.
pub struct StorageClient {
    http: reqwest::Client,
    base_url: Url,
    bucket: String,
    timeout: Option<Duration>,
}

impl StorageClient {
    pub fn new(
        base_url: &str,
        bucket: impl Into<String>,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client(api_key)?;
        let mut client = Self::from_reqwest(base_url, bucket, http)?;
        client.timeout = Some(transport.timeout);
        Ok(client)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(
        base_url: &str,
        bucket: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        let mut url = Url::parse(base_url)?;
        let path = url.path().trim_end_matches('/').to_owned();
        if path.ends_with("/storage/v1") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/storage/v1/"));
        }

        Ok(Self {
            http,
            base_url: url,
            bucket: bucket.into(),
            timeout: None,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        Error::from_transport(err, self.timeout)
    }

    fn object_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self
            .base_url
            .join(&format!("object/{}/{}", self.bucket, path.trim_start_matches('/')))?)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StorageErrorResponse>(&body)
            .ok()
            .and_then(|e| e.message.or(e.error))
            .unwrap_or_else(|| format!("HTTP {status}"));

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication { message });
        }
        Err(Error::Storage {
            message,
            status: status.as_u16(),
        })
    }
}

impl BlobStorage for StorageClient {
    async fn upload(&self, path: &str, body: Bytes, content_type: &str) -> Result<String, Error> {
        let url = self.object_url(path)?;
        debug!("POST {url} ({} bytes)", body.len());

        let content_type = HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", HeaderValue::from_static("false"))
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::check(resp).await?;

        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}object/public/{}/{}",
            self.base_url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }

    async fn remove(&self, paths: &[String]) -> Result<(), Error> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = self.base_url.join(&format!("object/{}", self.bucket))?;
        debug!("DELETE {url} prefixes={paths:?}");

        let resp = self
            .http
            .delete(url)
            .json(&json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::check(resp).await?;
        Ok(())
    }
}
