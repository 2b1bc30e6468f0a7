//! Typed client seams for the sibling services the orchestrator consults at
//! write time, plus their `reqwest` implementations.
//!
//! An absent remote entity surfaces as `Ok(None)`; a transport or decode
//! failure surfaces as `Err(ClientError)`. Callers decide which of the two is
//! fatal for the operation at hand.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};

use super::domain::{Borrower, LoanProduct, Vendor};

/// Failure reaching or decoding a remote service response.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected payload: {0}")]
    Decode(String),
    #[error("service unreachable: {0}")]
    Unreachable(String),
}

/// Lookup seam over the user management service.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_by_id(&self, id: u64) -> Result<Option<Borrower>, ClientError>;
}

/// Lookup seam over the admin service, which owns loan products and vendors.
#[async_trait]
pub trait AdminCatalog: Send + Sync {
    async fn product_by_id(&self, id: u64) -> Result<Option<LoanProduct>, ClientError>;
    async fn vendor_by_id(&self, id: u64) -> Result<Option<Vendor>, ClientError>;
    async fn products_by_name(&self, name: &str) -> Result<Vec<LoanProduct>, ClientError>;
}

/// `reqwest`-backed [`UserDirectory`] addressed by a base URL supplied at
/// construction.
#[derive(Debug, Clone)]
pub struct HttpUserDirectory {
    http: HttpClient,
    base_url: String,
}

impl HttpUserDirectory {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn user_by_id(&self, id: u64) -> Result<Option<Borrower>, ClientError> {
        let url = format!("{}/users/readOne/{id}", self.base_url);
        fetch_optional(&self.http, &url).await
    }
}

/// `reqwest`-backed [`AdminCatalog`] addressed by a base URL supplied at
/// construction.
#[derive(Debug, Clone)]
pub struct HttpAdminCatalog {
    http: HttpClient,
    base_url: String,
}

impl HttpAdminCatalog {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AdminCatalog for HttpAdminCatalog {
    async fn product_by_id(&self, id: u64) -> Result<Option<LoanProduct>, ClientError> {
        let url = format!("{}/loan-products/readOne/{id}", self.base_url);
        fetch_optional(&self.http, &url).await
    }

    async fn vendor_by_id(&self, id: u64) -> Result<Option<Vendor>, ClientError> {
        let url = format!("{}/vendors/readOne/{id}", self.base_url);
        fetch_optional(&self.http, &url).await
    }

    async fn products_by_name(&self, name: &str) -> Result<Vec<LoanProduct>, ClientError> {
        let url = format!("{}/loan-products/byProductName", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("productName", name)])
            .send()
            .await?
            .error_for_status()?;

        let products = response.json::<Vec<LoanProduct>>().await?;
        Ok(products)
    }
}

/// GET a single entity. A 404 or an empty/`null` body means the entity does
/// not exist; any other non-success status is a client error.
async fn fetch_optional<T>(http: &HttpClient, url: &str) -> Result<Option<T>, ClientError>
where
    T: serde::de::DeserializeOwned,
{
    let response = http.get(url).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    let response = response.error_for_status()?;
    let body = response.bytes().await?;
    if body.is_empty() {
        return Ok(None);
    }

    let value: Option<T> = serde_json::from_slice(&body)
        .map_err(|err| ClientError::Decode(format!("{url}: {err}")))?;
    Ok(value)
}
