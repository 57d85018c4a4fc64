//! QuickBooks Online REST adapter.
//!
//! Implements the `AccountingApi` port over reqwest. Every call carries the
//! bearer token of the `ApiScope` and the configured `minorversion`.
//!
//! # Configuration
//!
//! ```ignore
//! let config = QuickBooksApiConfig::new(SANDBOX_BASE_URL).with_minor_version(62);
//! let api = QuickBooksApiClient::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;

use crate::domain::accounting::EntityKind;
use crate::ports::{AccountingApi, AccountingApiError, ApiScope, QueryResponse};

pub const SANDBOX_BASE_URL: &str = "https://sandbox-quickbooks.api.intuit.com/v3";
pub const PRODUCTION_BASE_URL: &str = "https://quickbooks.api.intuit.com/v3";

/// Minor version pinned on every request.
pub const DEFAULT_MINOR_VERSION: u32 = 62;

/// Connection settings for the QuickBooks REST API.
#[derive(Debug, Clone)]
pub struct QuickBooksApiConfig {
    /// Base URL up to and including `/v3`.
    base_url: String,
    minor_version: u32,
    timeout: Duration,
}

impl QuickBooksApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            minor_version: DEFAULT_MINOR_VERSION,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_minor_version(mut self, minor_version: u32) -> Self {
        self.minor_version = minor_version;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// reqwest implementation of `AccountingApi`.
pub struct QuickBooksApiClient {
    config: QuickBooksApiConfig,
    http_client: reqwest::Client,
}

impl QuickBooksApiClient {
    pub fn new(config: QuickBooksApiConfig) -> Result<Self, AccountingApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AccountingApiError::Transport(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn company_url(&self, realm_id: &str, tail: &str) -> String {
        format!("{}/company/{}/{}", self.config.base_url, realm_id, tail)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        scope: ApiScope<'_>,
    ) -> Result<Value, AccountingApiError> {
        let response = request
            .bearer_auth(scope.access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AccountingApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "QuickBooks call failed");
            return Err(AccountingApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AccountingApiError::Decode(format!("Failed to parse response: {}", e)))
    }
}

/// Percent-encodes a statement for the `query` parameter.
///
/// `%` is passed through untouched so the `%25` escapes rendered by the
/// query builder reach the provider as written.
pub(crate) fn encode_statement(statement: &str) -> String {
    statement
        .split('%')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("%")
}

fn take_envelope(mut body: Value, key: &str) -> Result<Value, AccountingApiError> {
    match body.get_mut(key) {
        Some(inner) => Ok(inner.take()),
        None => Err(AccountingApiError::Decode(format!(
            "response has no {} object",
            key
        ))),
    }
}

#[async_trait]
impl AccountingApi for QuickBooksApiClient {
    async fn query(
        &self,
        scope: ApiScope<'_>,
        statement: &str,
    ) -> Result<QueryResponse, AccountingApiError> {
        let url = format!(
            "{}?query={}&minorversion={}",
            self.company_url(scope.realm_id, "query"),
            encode_statement(statement),
            self.config.minor_version
        );
        tracing::debug!(realm_id = scope.realm_id, statement, "QuickBooks query");

        let body = self.send(self.http_client.get(&url), scope).await?;
        match take_envelope(body, "QueryResponse")? {
            Value::Object(rows) => Ok(QueryResponse::new(rows)),
            other => Err(AccountingApiError::Decode(format!(
                "QueryResponse is not an object: {}",
                other
            ))),
        }
    }

    async fn read(
        &self,
        scope: ApiScope<'_>,
        entity: EntityKind,
        id: &str,
    ) -> Result<Value, AccountingApiError> {
        let url = format!(
            "{}?minorversion={}",
            self.company_url(
                scope.realm_id,
                &format!("{}/{}", entity.path_segment(), urlencoding::encode(id))
            ),
            self.config.minor_version
        );
        tracing::debug!(realm_id = scope.realm_id, entity = %entity, id, "QuickBooks read");

        let body = self.send(self.http_client.get(&url), scope).await?;
        take_envelope(body, entity.as_str())
    }

    async fn write(
        &self,
        scope: ApiScope<'_>,
        entity: EntityKind,
        body: &Value,
    ) -> Result<Value, AccountingApiError> {
        let url = format!(
            "{}?minorversion={}",
            self.company_url(scope.realm_id, entity.path_segment()),
            self.config.minor_version
        );
        tracing::debug!(realm_id = scope.realm_id, entity = %entity, "QuickBooks write");

        let request = self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        let response = self.send(request, scope).await?;
        take_envelope(response, entity.as_str())
    }
}
