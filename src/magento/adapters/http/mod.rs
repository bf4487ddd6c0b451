//! `reqwest` client for the Magento REST API.

mod wire;

use crate::magento::{
    domain::{BulkAccepted, BulkMethod, BulkRequest, BulkSummary, MagentoRegion, MagentoTaxRate},
    ports::{MagentoBulkSupport, MagentoError, MagentoResult, MagentoTaxRateGateway},
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use wire::{CountryInfo, DetailedBulkStatus, ErrorBody, SearchResults, TaxRateEnvelope};

const SEARCH_PAGE_SIZE: u32 = 200;

/// Connection settings for [`MagentoHttpClient`].
#[derive(Clone, PartialEq, Eq)]
pub struct MagentoClientConfig {
    /// Storefront base URL, such as `https://shop.example`.
    pub base_url: String,
    /// Integration access token.
    pub access_token: String,
    /// Store view code used in REST paths.
    pub store_code: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for MagentoClientConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("MagentoClientConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("store_code", &self.store_code)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Magento REST client authenticating with a bearer token.
#[derive(Clone)]
pub struct MagentoHttpClient {
    client: Client,
    rest_url: String,
    access_token: String,
}

impl std::fmt::Debug for MagentoHttpClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("MagentoHttpClient")
            .field("rest_url", &self.rest_url)
            .finish_non_exhaustive()
    }
}

impl MagentoHttpClient {
    /// Creates a client rooted at `{base_url}/rest/{store_code}`.
    ///
    /// # Errors
    ///
    /// Returns [`MagentoError::Configuration`] when the token is blank or the
    /// HTTP client cannot be built.
    pub fn new(config: &MagentoClientConfig) -> MagentoResult<Self> {
        if config.access_token.trim().is_empty() {
            return Err(MagentoError::Configuration(
                "access token must not be empty".to_owned(),
            ));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| MagentoError::Configuration(err.to_string()))?;
        Ok(Self {
            client,
            rest_url: format!(
                "{}/rest/{}",
                config.base_url.trim_end_matches('/'),
                config.store_code
            ),
            access_token: config.access_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.rest_url))
            .bearer_auth(&self.access_token)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> MagentoResult<T> {
        let response = request
            .send()
            .await
            .map_err(|err| MagentoError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| MagentoError::Transport(err.to_string()))?;
        if !status.is_success() {
            let error = error_for_status(status, resource, &body);
            warn!(%status, resource, error = %error, "Magento request failed");
            return Err(error);
        }
        let payload = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(payload).map_err(|err| MagentoError::Decode(err.to_string()))
    }
}

fn error_for_status(status: StatusCode, resource: &str, body: &str) -> MagentoError {
    match status {
        StatusCode::UNAUTHORIZED => MagentoError::Unauthorized,
        StatusCode::NOT_FOUND => MagentoError::NotFound(resource.to_owned()),
        _ => {
            let message = serde_json::from_str::<ErrorBody>(body)
                .map_or_else(|_| body.trim().to_owned(), |parsed| parsed.rendered());
            MagentoError::Http {
                status: status.as_u16(),
                message,
            }
        }
    }
}

const fn bulk_method(method: BulkMethod) -> Method {
    match method {
        BulkMethod::Post => Method::POST,
        BulkMethod::Put => Method::PUT,
        BulkMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl MagentoTaxRateGateway for MagentoHttpClient {
    async fn list_tax_rates(&self) -> MagentoResult<Vec<MagentoTaxRate>> {
        let mut rates = Vec::new();
        let mut current_page: u32 = 1;
        loop {
            let page_size = SEARCH_PAGE_SIZE.to_string();
            let page_number = current_page.to_string();
            let request = self.request(Method::GET, "/V1/taxRates/search").query(&[
                ("searchCriteria[pageSize]", page_size.as_str()),
                ("searchCriteria[currentPage]", page_number.as_str()),
            ]);
            let page: SearchResults<MagentoTaxRate> = self.send(request, "taxRates").await?;
            let fetched = page.items.len();
            rates.extend(page.items);
            debug!(page = current_page, fetched, total = page.total_count, "fetched tax rate page");
            let collected = u64::try_from(rates.len()).unwrap_or(u64::MAX);
            if fetched == 0 || collected >= page.total_count {
                return Ok(rates);
            }
            current_page = current_page.saturating_add(1);
        }
    }

    async fn create_tax_rate(&self, rate: &MagentoTaxRate) -> MagentoResult<MagentoTaxRate> {
        let request = self
            .request(Method::POST, "/V1/taxRates")
            .json(&TaxRateEnvelope { tax_rate: rate });
        self.send(request, &rate.code).await
    }

    async fn update_tax_rate(&self, rate: &MagentoTaxRate) -> MagentoResult<MagentoTaxRate> {
        let request = self
            .request(Method::PUT, "/V1/taxRates")
            .json(&TaxRateEnvelope { tax_rate: rate });
        self.send(request, &rate.code).await
    }

    async fn delete_tax_rate(&self, id: u64) -> MagentoResult<()> {
        let request = self.request(Method::DELETE, &format!("/V1/taxRates/{id}"));
        let _deleted: Option<bool> = self.send(request, &format!("taxRates/{id}")).await?;
        Ok(())
    }

    async fn list_regions(&self, country: &str) -> MagentoResult<Vec<MagentoRegion>> {
        let request = self.request(Method::GET, &format!("/V1/directory/countries/{country}"));
        let info: CountryInfo = self.send(request, country).await?;
        info.available_regions
            .unwrap_or_default()
            .into_iter()
            .map(|region| {
                let id = region.id.parse::<u64>().map_err(|err| {
                    MagentoError::Decode(format!("region id {:?}: {err}", region.id))
                })?;
                Ok(MagentoRegion {
                    id,
                    code: region.code,
                    name: region.name,
                })
            })
            .collect()
    }
}

#[async_trait]
impl MagentoBulkSupport for MagentoHttpClient {
    async fn submit_bulk(&self, request: &BulkRequest) -> MagentoResult<BulkAccepted> {
        let path = format!("/async/bulk/V1/{}", request.topic);
        debug!(
            topic = %request.topic,
            method = %request.method,
            operations = request.payloads.len(),
            "submitting Magento bulk"
        );
        let builder = self
            .request(bulk_method(request.method), &path)
            .json(&request.payloads);
        self.send(builder, &request.topic).await
    }

    async fn bulk_status(&self, bulk_uuid: &str) -> MagentoResult<BulkSummary> {
        let request = self.request(Method::GET, &format!("/V1/bulk/{bulk_uuid}/detailed-status"));
        let status: DetailedBulkStatus = self.send(request, bulk_uuid).await?;
        Ok(BulkSummary {
            bulk_uuid: status.bulk_id,
            operations: status.operations_list,
        })
    }
}
