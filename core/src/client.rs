//! Stateless HTTP request builder and response parser for the auto-api
//! car-listings API.
//!
//! # Design
//! `AutoApiClient` holds only its `ClientConfig` and carries no mutable
//! state between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. `BlockingClient` pairs the two with a `Transport`; hosts
//! with their own HTTP stack can drive this type directly.
//!
//! GET endpoints authenticate with an `api_key` query parameter, the offer
//! lookup by URL authenticates with an `x-api-key` header and always goes to
//! `/api/v1/offer/info` whatever version is configured.

use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{ChangeIdResponse, OfferInfoRequest, OffersQuery};

/// How much of an undecodable body is quoted in the error message.
const BODY_SNIPPET_CHARS: usize = 200;

/// Synchronous, stateless client for the auto-api REST API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct AutoApiClient {
    config: ClientConfig,
}

impl AutoApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET /api/{version}/{source}/filters`
    pub fn build_get_filters(&self, source: &str) -> Result<HttpRequest, ApiError> {
        self.get(source, "filters", Vec::new())
    }

    /// `GET /api/{version}/{source}/offers`
    pub fn build_get_offers(&self, source: &str, query: &OffersQuery) -> Result<HttpRequest, ApiError> {
        self.get(source, "offers", query.to_params())
    }

    /// `GET /api/{version}/{source}/offer`
    pub fn build_get_offer(&self, source: &str, inner_id: &str) -> Result<HttpRequest, ApiError> {
        self.get(source, "offer", vec![("inner_id", inner_id.to_string())])
    }

    /// `GET /api/{version}/{source}/change_id`; `date` is `yyyy-mm-dd`.
    pub fn build_get_change_id(&self, source: &str, date: &str) -> Result<HttpRequest, ApiError> {
        self.get(source, "change_id", vec![("date", date.to_string())])
    }

    /// `GET /api/{version}/{source}/changes`
    pub fn build_get_changes(&self, source: &str, change_id: i64) -> Result<HttpRequest, ApiError> {
        self.get(source, "changes", vec![("change_id", change_id.to_string())])
    }

    /// `POST /api/v1/offer/info` with the marketplace URL in a JSON body.
    pub fn build_get_offer_by_url(&self, offer_url: &str) -> Result<HttpRequest, ApiError> {
        let url = self.endpoint(&["api", "v1", "offer", "info"])?;
        let body = serde_json::to_string(&OfferInfoRequest {
            url: offer_url.to_string(),
        })?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("x-api-key".to_string(), self.config.api_key().to_string()),
            ],
            body: Some(body),
        })
    }

    /// Decode a 2xx JSON body as-is; map anything else to `ApiError`.
    pub fn parse_json(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    /// Extract the integer `change_id` from a `change_id` response.
    pub fn parse_change_id(&self, response: HttpResponse) -> Result<i64, ApiError> {
        check_status(&response)?;
        let value = decode(&response)?;
        serde_json::from_value::<ChangeIdResponse>(value)
            .map(|parsed| parsed.change_id)
            .map_err(|e| {
                rejected(ApiError::Api {
                    status: response.status,
                    message: format!("Unexpected change_id response: {e}"),
                    body: response.body,
                })
            })
    }

    fn get(
        &self,
        source: &str,
        endpoint: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = self.endpoint(&["api", self.config.api_version(), source, endpoint])?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("api_key", self.config.api_key());
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        })
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let base = self.config.base_url();
        let mut url = Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("{base}: cannot carry a path")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Map non-2xx status codes to `Auth` or `Api`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(rejected(ApiError::from_status(response.status, response.body.clone())))
}

fn decode(response: &HttpResponse) -> Result<Value, ApiError> {
    serde_json::from_str(&response.body).map_err(|_| {
        let snippet: String = response.body.chars().take(BODY_SNIPPET_CHARS).collect();
        rejected(ApiError::Api {
            status: response.status,
            message: format!("Invalid JSON response: {snippet}"),
            body: response.body.clone(),
        })
    })
}

/// Every response that maps to an error is logged here once.
fn rejected(err: ApiError) -> ApiError {
    tracing::warn!(status = err.status().unwrap_or_default(), auth = err.is_auth(), "{err}");
    err
}
