//! Synchronous client for the auto-api.com car-listings API.
//!
//! # Overview
//! Six endpoints: available filters, paginated offers, a single offer, the
//! change-feed cursor for a date, the change feed itself, and offer lookup by
//! marketplace URL. Responses are returned as `serde_json::Value`, unmodified.
//!
//! # Design
//! - `AutoApiClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network (host-does-IO pattern).
//! - `BlockingClient` pairs it with a `Transport` (`UreqTransport` by
//!   default) so each operation is a single blocking call.
//! - `ApiError` keeps auth failures (401/403) as a distinct kind of API
//!   error; see `ApiError::is_auth`.
//!
//! ```no_run
//! use auto_api::{BlockingClient, OffersQuery};
//!
//! let client = BlockingClient::new("your-api-key");
//! let query = OffersQuery {
//!     brand: Some("Hyundai".to_string()),
//!     year_from: Some(2020),
//!     ..OffersQuery::new(1)
//! };
//! let offers = client.get_offers("encar", &query)?;
//! println!("{}", offers["meta"]["next_page"]);
//! # Ok::<(), auto_api::ApiError>(())
//! ```

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use blocking::BlockingClient;
pub use client::AutoApiClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{ChangeIdResponse, OfferInfoRequest, OffersQuery};
