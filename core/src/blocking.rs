//! One-call client: build the request, execute it, parse the response.

use serde_json::Value;

use crate::client::AutoApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::OffersQuery;

/// Blocking client for the auto-api REST API.
///
/// Every method performs exactly one HTTP request. Nothing is cached and
/// nothing is retried; pagination and change-feed traversal are left to the
/// caller.
#[derive(Debug, Clone)]
pub struct BlockingClient<T = UreqTransport> {
    core: AutoApiClient,
    transport: T,
}

impl BlockingClient<UreqTransport> {
    /// Client with default version, base URL and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(api_key))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> BlockingClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            core: AutoApiClient::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.core.config()
    }

    /// Available filters for a source (brands, models, body types, ...).
    pub fn get_filters(&self, source: &str) -> Result<Value, ApiError> {
        let req = self.core.build_get_filters(source)?;
        self.core.parse_json(self.send(&req)?)
    }

    /// One page of offers. The body carries `result` and
    /// `meta.page` / `meta.next_page`.
    pub fn get_offers(&self, source: &str, query: &OffersQuery) -> Result<Value, ApiError> {
        let req = self.core.build_get_offers(source, query)?;
        self.core.parse_json(self.send(&req)?)
    }

    pub fn get_offer(&self, source: &str, inner_id: &str) -> Result<Value, ApiError> {
        let req = self.core.build_get_offer(source, inner_id)?;
        self.core.parse_json(self.send(&req)?)
    }

    /// The change-feed cursor for a `yyyy-mm-dd` date.
    pub fn get_change_id(&self, source: &str, date: &str) -> Result<i64, ApiError> {
        let req = self.core.build_get_change_id(source, date)?;
        self.core.parse_change_id(self.send(&req)?)
    }

    /// Changes starting at `change_id`. The body carries `result` and
    /// `meta.cur_change_id` / `meta.next_change_id`.
    pub fn get_changes(&self, source: &str, change_id: i64) -> Result<Value, ApiError> {
        let req = self.core.build_get_changes(source, change_id)?;
        self.core.parse_json(self.send(&req)?)
    }

    /// Offer data for a marketplace listing URL.
    pub fn get_offer_by_url(&self, url: &str) -> Result<Value, ApiError> {
        let req = self.core.build_get_offer_by_url(url)?;
        self.core.parse_json(self.send(&req)?)
    }

    fn send(&self, req: &HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = %req.method, path = req.path(), "sending request");
        let response = self.transport.execute(req).inspect_err(|e| {
            tracing::warn!(method = %req.method, path = req.path(), error = %e, "request failed");
        })?;
        tracing::debug!(status = response.status, bytes = response.body.len(), "received response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use serde_json::json;

    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::capture_logs;

    /// Replays canned responses and records every request it sees.
    #[derive(Default)]
    struct FakeTransport {
        responses: RefCell<VecDeque<Result<HttpResponse, ApiError>>>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn replying(status: u16, body: &str) -> Self {
            let fake = Self::default();
            fake.responses
                .borrow_mut()
                .push_back(Ok(HttpResponse::new(status, body)));
            fake
        }

        fn failing(message: &str) -> Self {
            let fake = Self::default();
            fake.responses
                .borrow_mut()
                .push_back(Err(ApiError::Transport(ureq::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    message.to_string(),
                )))));
            fake
        }

        fn last(&self) -> HttpRequest {
            self.seen.borrow().last().cloned().expect("no request sent")
        }
    }

    impl Transport for &FakeTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::new(200, "{}")))
        }
    }

    fn client(fake: &FakeTransport) -> BlockingClient<&FakeTransport> {
        BlockingClient::with_transport(ClientConfig::new("test-key"), fake)
    }

    #[test]
    fn get_filters_returns_parsed_body() {
        let fake = FakeTransport::replying(200, r#"{"brands":["Toyota","Honda"]}"#);
        let filters = client(&fake).get_filters("encar").unwrap();
        assert_eq!(filters, json!({ "brands": ["Toyota", "Honda"] }));
        assert_eq!(
            fake.last().url,
            "https://auto-api.com/api/v2/encar/filters?api_key=test-key"
        );
    }

    #[test]
    fn get_offers_sends_page_and_filters() {
        let fake = FakeTransport::replying(200, r#"{"result":[],"meta":{"page":2,"next_page":0}}"#);
        let query = OffersQuery {
            brand: Some("BMW".to_string()),
            year_from: Some(2020),
            ..OffersQuery::new(2)
        };
        let offers = client(&fake).get_offers("mobile_de", &query).unwrap();
        assert_eq!(offers["meta"]["page"], 2);

        let url = fake.last().url;
        assert!(url.contains("/api/v2/mobile_de/offers?"));
        assert!(url.contains("page=2"));
        assert!(url.contains("brand=BMW"));
        assert!(url.contains("year_from=2020"));
        assert!(url.ends_with("api_key=test-key"));
    }

    #[test]
    fn get_offer_sends_inner_id() {
        let fake = FakeTransport::replying(200, r#"{"inner_id":"abc123","brand":"Toyota"}"#);
        let offer = client(&fake).get_offer("encar", "abc123").unwrap();
        assert_eq!(offer["inner_id"], "abc123");
        assert!(fake.last().url.contains("inner_id=abc123"));
    }

    #[test]
    fn get_change_id_returns_integer() {
        let fake = FakeTransport::replying(200, r#"{"change_id":0}"#);
        assert_eq!(client(&fake).get_change_id("encar", "2024-01-01").unwrap(), 0);
        assert!(fake.last().url.contains("date=2024-01-01"));
    }

    #[test]
    fn get_changes_sends_change_id() {
        let fake = FakeTransport::replying(200, r#"{"added":[],"changed":[],"removed":[]}"#);
        let changes = client(&fake).get_changes("encar", 42567).unwrap();
        assert_eq!(changes["added"], json!([]));
        assert!(fake.last().url.contains("change_id=42567"));
    }

    #[test]
    fn get_offer_by_url_posts_json_with_header_key() {
        let fake = FakeTransport::replying(200, r#"{"brand":"BMW","model":"X5","price":45000}"#);
        let info = client(&fake)
            .get_offer_by_url("https://www.encar.com/car/123")
            .unwrap();
        assert_eq!(info["price"], 45000);

        let req = fake.last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://auto-api.com/api/v1/offer/info");
        assert_eq!(req.header("x-api-key"), Some("test-key"));
        assert_eq!(req.body.as_deref(), Some(r#"{"url":"https://www.encar.com/car/123"}"#));
    }

    #[test]
    fn error_status_is_mapped() {
        let fake = FakeTransport::replying(403, r#"{"message":"Forbidden"}"#);
        let err = client(&fake)
            .get_offers("encar", &OffersQuery::new(1))
            .unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.to_string(), "API error 403: Forbidden");
    }

    #[test]
    fn transport_failure_is_propagated() {
        let fake = FakeTransport::failing("timed out");
        let err = client(&fake).get_filters("encar").unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn api_key_is_never_logged() {
        let fake = FakeTransport::replying(200, r#"{"result":[]}"#);
        let client = BlockingClient::with_transport(ClientConfig::new("secret-key-123"), &fake);
        let (result, logs) = capture_logs(|| client.get_offer("encar", "abc123"));
        assert!(result.is_ok());
        assert!(fake.last().url.contains("secret-key-123"));
        assert!(logs.contains("sending request"));
        assert!(logs.contains("/api/v2/encar/offer"));
        assert!(!logs.contains("secret-key-123"), "{logs}");
    }

    #[test]
    fn failed_requests_are_logged_as_warnings() {
        let fake = FakeTransport::failing("timed out");
        let (result, logs) = capture_logs(|| client(&fake).get_filters("encar"));
        assert!(result.is_err());
        assert!(logs.contains("WARN"));
        assert!(logs.contains("request failed"));
        assert!(logs.contains("timed out"));
        assert!(!logs.contains("test-key"), "{logs}");
    }

    #[test]
    fn rejected_responses_are_logged_as_warnings() {
        let fake = FakeTransport::replying(401, r#"{"message":"Invalid API key"}"#);
        let (result, logs) = capture_logs(|| client(&fake).get_changes("encar", 1));
        assert!(result.unwrap_err().is_auth());
        assert!(logs.contains("WARN"));
        assert!(logs.contains("API error 401: Invalid API key"));
        assert!(logs.contains("auth=true"));
    }

    #[test]
    fn bad_base_url_fails_before_sending() {
        let fake = FakeTransport::default();
        let client = BlockingClient::with_transport(ClientConfig::new("k").with_base_url("::"), &fake);
        assert!(matches!(client.get_filters("encar"), Err(ApiError::InvalidUrl(_))));
        assert!(fake.seen.borrow().is_empty());
    }

    #[test]
    fn default_client_uses_default_config() {
        let client = BlockingClient::new("k");
        assert_eq!(client.config().api_version(), "v2");
        assert_eq!(client.config().base_url(), "https://auto-api.com");
    }
}
