// Collection service HTTP client
//
// Speaks the PostgREST dialect: collections live under `/rest/v1/{name}`,
// filters are `column=op.value` query pairs, writes ask for
// `Prefer: return=minimal` so the service acknowledges with an empty 201/204.

use std::time::Duration;

use reqwest::header::HeaderValue;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::gateway::{CollectionGateway, Row, RowKey};
use crate::query::{Filter, Query};
use crate::transport::TransportConfig;

const PREFER_MINIMAL: &str = "return=minimal";
const PREFER_MERGE: &str = "resolution=merge-duplicates,return=minimal";

/// Characters of a non-JSON body kept in error messages.
const PREVIEW_CHARS: usize = 200;

/// Error envelope: `{"code": "23502", "message": "...", "details": ..., "hint": ...}`.
#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Async client for the remote collection service.
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    /// Request timeout the client was built with, if known.
    timeout: Option<Duration>,
}

impl RestClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from the project URL, API key, and transport settings.
    ///
    /// `base_url` is the project root (e.g. `https://abc.example.co`);
    /// `/rest/v1/` is appended unless already present.
    pub fn new(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client(api_key)?;
        let mut client = Self::from_reqwest(base_url, http)?;
        client.timeout = Some(transport.timeout);
        Ok(client)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout: None,
        })
    }

    /// Ensure the base URL ends with `/rest/v1/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/rest/v1") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/rest/v1/"));
        }

        Ok(url)
    }

    /// The normalized `/rest/v1/` base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, collection: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(collection)?)
    }

    // ── Response handling ────────────────────────────────────────────

    fn transport_error(&self, err: reqwest::Error) -> Error {
        Error::from_transport(err, self.timeout)
    }

    /// Turn a non-2xx response into an [`Error`]; pass 2xx through.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: parse_message(&body).unwrap_or_else(|| "invalid API key".into()),
            });
        }

        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(Error::Unavailable(
                parse_message(&body).unwrap_or_else(|| "HTTP 503".into()),
            ));
        }

        let parsed: Option<ErrorResponse> = serde_json::from_str(&body).ok();
        Err(match parsed {
            Some(err) => Error::Remote {
                message: err
                    .message
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
                code: err.code,
                status: status.as_u16(),
                details: err.details,
                hint: err.hint,
            },
            None => Error::Remote {
                message: format!("HTTP {status}: {}", preview(&body)),
                code: None,
                status: status.as_u16(),
                details: None,
                hint: None,
            },
        })
    }
}

/// First 200 characters of `body`, cut on a char boundary.
fn preview(body: &str) -> &str {
    body.char_indices()
        .nth(PREVIEW_CHARS)
        .map_or(body, |(i, _)| &body[..i])
}

fn parse_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.message)
}

fn key_param(key: &RowKey) -> (String, String) {
    Filter::eq(key.column.clone(), key.value.clone()).to_param()
}

impl CollectionGateway for RestClient {
    async fn select(&self, collection: &str, query: &Query) -> Result<Vec<Row>, Error> {
        let url = self.url(collection)?;
        let params = query.to_params();
        debug!("GET {url} params={params:?}");

        let resp = self
            .http
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let resp = Self::check(resp).await?;
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        trace!(bytes = body.len(), "select response");

        serde_json::from_str(&body).map_err(|e| {
            let preview = preview(&body);
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    async fn insert(&self, collection: &str, row: Row) -> Result<(), Error> {
        let url = self.url(collection)?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .header("Prefer", HeaderValue::from_static(PREFER_MINIMAL))
            .json(&row)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn update(&self, collection: &str, key: &RowKey, patch: Row) -> Result<(), Error> {
        let url = self.url(collection)?;
        debug!("PATCH {url} where {key}");

        let resp = self
            .http
            .patch(url)
            .query(&[key_param(key)])
            .header("Prefer", HeaderValue::from_static(PREFER_MINIMAL))
            .json(&patch)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &RowKey) -> Result<(), Error> {
        let url = self.url(collection)?;
        debug!("DELETE {url} where {key}");

        let resp = self
            .http
            .delete(url)
            .query(&[key_param(key)])
            .header("Prefer", HeaderValue::from_static(PREFER_MINIMAL))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, row: Row, conflict_key: &str) -> Result<(), Error> {
        let url = self.url(collection)?;
        debug!("POST {url} on_conflict={conflict_key}");

        let resp = self
            .http
            .post(url)
            .query(&[("on_conflict", conflict_key)])
            .header("Prefer", HeaderValue::from_static(PREFER_MERGE))
            .json(&row)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::check(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_rest_prefix() {
        let url = RestClient::normalize_base_url("https://abc.example.co").unwrap();
        assert_eq!(url.as_str(), "https://abc.example.co/rest/v1/");
    }

    #[test]
    fn existing_rest_prefix_is_kept() {
        let url = RestClient::normalize_base_url("http://localhost:54321/rest/v1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:54321/rest/v1/");
    }

    #[test]
    fn collection_url_joins_under_prefix() {
        let client =
            RestClient::from_reqwest("https://abc.example.co/", reqwest::Client::new()).unwrap();
        assert_eq!(
            client.url("news").unwrap().as_str(),
            "https://abc.example.co/rest/v1/news"
        );
    }

    #[test]
    fn preview_cuts_on_char_boundary() {
        let body = format!("{}€ tail", "a".repeat(199));
        let cut = preview(&body);
        assert_eq!(cut.chars().count(), PREVIEW_CHARS);
        assert!(cut.ends_with('€'));
        assert_eq!(preview("short"), "short");
    }
}
