//! Request and response payloads for the auto-api endpoints.
//!
//! Response bodies are passed to callers as `serde_json::Value`; only the
//! shapes the client itself needs to read or write are typed here.

use serde::{Deserialize, Serialize};

/// Page number plus optional filters for the offers listing.
///
/// Unset filters are left out of the query string entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OffersQuery {
    pub page: u32,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub configuration: Option<String>,
    pub complectation: Option<String>,
    pub transmission: Option<String>,
    pub color: Option<String>,
    pub body_type: Option<String>,
    pub engine_type: Option<String>,
    pub year_from: Option<u32>,
    pub year_to: Option<u32>,
    pub mileage_from: Option<u64>,
    pub mileage_to: Option<u64>,
    pub price_from: Option<u64>,
    pub price_to: Option<u64>,
}

impl OffersQuery {
    pub fn new(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    /// Query parameters in a stable order, `page` first.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string())];
        push(&mut params, "brand", self.brand.as_ref());
        push(&mut params, "model", self.model.as_ref());
        push(&mut params, "configuration", self.configuration.as_ref());
        push(&mut params, "complectation", self.complectation.as_ref());
        push(&mut params, "transmission", self.transmission.as_ref());
        push(&mut params, "color", self.color.as_ref());
        push(&mut params, "body_type", self.body_type.as_ref());
        push(&mut params, "engine_type", self.engine_type.as_ref());
        push(&mut params, "year_from", self.year_from.as_ref());
        push(&mut params, "year_to", self.year_to.as_ref());
        push(&mut params, "mileage_from", self.mileage_from.as_ref());
        push(&mut params, "mileage_to", self.mileage_to.as_ref());
        push(&mut params, "price_from", self.price_from.as_ref());
        push(&mut params, "price_to", self.price_to.as_ref());
        params
    }
}

fn push<T: ToString>(params: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&T>) {
    if let Some(value) = value {
        params.push((key, value.to_string()));
    }
}

/// Body of `POST /api/v1/offer/info`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferInfoRequest {
    pub url: String,
}

/// The part of the `change_id` response the client reads.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct ChangeIdResponse {
    pub change_id: i64,
}
