//! In-process stand-in for the auto-api.com REST API.
//!
//! Serves a small fixed catalogue of offers and a change feed for two
//! sources, authenticates GET requests by the `api_key` query parameter and
//! the offer-by-URL POST by the `x-api-key` header, and answers errors with a
//! JSON `{"message": ...}` body the way the real API does.

use std::{collections::BTreeSet, collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const SOURCES: &[&str] = &["encar", "mobile_de"];
pub const VERSIONS: &[&str] = &["v1", "v2"];
pub const PAGE_SIZE: usize = 2;
pub const CHANGES_PAGE_SIZE: usize = 3;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Offer {
    pub inner_id: String,
    pub source: String,
    pub data: OfferData,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OfferData {
    pub mark: String,
    pub model: String,
    pub transmission: String,
    pub color: String,
    pub body_type: String,
    pub engine_type: String,
    pub year: u32,
    pub km_age: u64,
    pub price: u64,
    pub url: String,
    pub seller_type: String,
    pub images: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Change {
    pub change_id: i64,
    pub inner_id: String,
    pub change_type: String,
    pub date: String,
}

#[derive(Clone)]
struct AppState {
    api_key: Arc<str>,
    offers: Arc<Vec<Offer>>,
    changes: Arc<Vec<Change>>,
}

/// Error answered as `{"message": ...}` with the given status.
struct Failure(StatusCode, String);

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self(status, message.into())
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "message": self.1 }))).into_response()
    }
}

type Reply = Result<Json<Value>, Failure>;
type Params = HashMap<String, String>;

/// Router accepting `api_key` as the only valid credential.
pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        offers: Arc::new(seed_offers()),
        changes: Arc::new(seed_changes()),
    };
    // The offer-by-URL endpoint `/api/v1/offer/info` shares this shape.
    Router::new()
        .route(
            "/api/{version}/{source}/{endpoint}",
            get(dispatch_get).post(dispatch_post),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

async fn dispatch_get(
    State(state): State<AppState>,
    Path((version, source, endpoint)): Path<(String, String, String)>,
    Query(params): Query<Params>,
) -> Reply {
    if params.get("api_key").map(String::as_str) != Some(&*state.api_key) {
        return Err(Failure::new(StatusCode::UNAUTHORIZED, "Invalid API key"));
    }
    if !VERSIONS.contains(&version.as_str()) {
        return Err(Failure::new(StatusCode::NOT_FOUND, "Unknown API version"));
    }
    if !SOURCES.contains(&source.as_str()) {
        return Err(Failure::new(StatusCode::NOT_FOUND, "Source not found"));
    }

    match endpoint.as_str() {
        "filters" => Ok(filters(&state, &source)),
        "offers" => offers(&state, &source, &params),
        "offer" => offer(&state, &source, &params),
        "change_id" => change_id(&state, &source, &params),
        "changes" => changes(&state, &source, &params),
        _ => Err(Failure::new(StatusCode::NOT_FOUND, "Not found")),
    }
}

async fn dispatch_post(
    State(state): State<AppState>,
    Path((version, source, endpoint)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: String,
) -> Reply {
    if (version.as_str(), source.as_str(), endpoint.as_str()) != ("v1", "offer", "info") {
        return Err(Failure::new(StatusCode::NOT_FOUND, "Not found"));
    }
    let key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    if key != Some(&*state.api_key) {
        return Err(Failure::new(StatusCode::UNAUTHORIZED, "Invalid API key"));
    }

    #[derive(Deserialize)]
    struct InfoRequest {
        url: String,
    }
    let request: InfoRequest = serde_json::from_str(&body)
        .map_err(|_| Failure::new(StatusCode::UNPROCESSABLE_ENTITY, "url is required"))?;

    state
        .offers
        .iter()
        .find(|offer| offer.data.url == request.url)
        .map(|offer| Json(json!(offer.data)))
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Offer not found"))
}

fn filters(state: &AppState, source: &str) -> Json<Value> {
    let offers = &state.offers;
    Json(json!({
        "brands": distinct(offers, source, |d| d.mark.as_str()),
        "models": distinct(offers, source, |d| d.model.as_str()),
        "transmissions": distinct(offers, source, |d| d.transmission.as_str()),
        "colors": distinct(offers, source, |d| d.color.as_str()),
        "body_types": distinct(offers, source, |d| d.body_type.as_str()),
        "engine_types": distinct(offers, source, |d| d.engine_type.as_str()),
    }))
}

/// Sorted distinct values of one field across a source's offers.
fn distinct(offers: &[Offer], source: &str, field: fn(&OfferData) -> &str) -> Vec<String> {
    offers
        .iter()
        .filter(|offer| offer.source == source)
        .map(|offer| field(&offer.data).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn offers(state: &AppState, source: &str, params: &Params) -> Reply {
    let page: usize = required(params, "page")?;
    if page == 0 {
        return Err(Failure::new(StatusCode::UNPROCESSABLE_ENTITY, "page must be positive"));
    }

    let text = |key: &str| params.get(key).map(String::as_str);
    let number = |key: &str| optional::<u64>(params, key);
    let (year_from, year_to) = (number("year_from")?, number("year_to")?);
    let (mileage_from, mileage_to) = (number("mileage_from")?, number("mileage_to")?);
    let (price_from, price_to) = (number("price_from")?, number("price_to")?);

    let matches = |offer: &&Offer| {
        let d = &offer.data;
        let eq = |key: &str, value: &str| text(key).map_or(true, |want| want.eq_ignore_ascii_case(value));
        let within = |value: u64, from: Option<u64>, to: Option<u64>| {
            from.map_or(true, |from| value >= from) && to.map_or(true, |to| value <= to)
        };
        offer.source == source
            && eq("brand", &d.mark)
            && eq("model", &d.model)
            && eq("transmission", &d.transmission)
            && eq("color", &d.color)
            && eq("body_type", &d.body_type)
            && eq("engine_type", &d.engine_type)
            && within(u64::from(d.year), year_from, year_to)
            && within(d.km_age, mileage_from, mileage_to)
            && within(d.price, price_from, price_to)
    };
    let found: Vec<&Offer> = state.offers.iter().filter(matches).collect();

    let start = (page - 1)
        .checked_mul(PAGE_SIZE)
        .ok_or_else(|| Failure::new(StatusCode::UNPROCESSABLE_ENTITY, "page is out of range"))?;
    let result: Vec<&Offer> = found.iter().skip(start).take(PAGE_SIZE).copied().collect();
    let next_page = if start.saturating_add(PAGE_SIZE) < found.len() { page + 1 } else { 0 };

    Ok(Json(json!({
        "result": result,
        "meta": { "page": page, "next_page": next_page, "limit": PAGE_SIZE },
    })))
}

fn offer(state: &AppState, source: &str, params: &Params) -> Reply {
    let inner_id: String = required(params, "inner_id")?;
    let result: Vec<&Offer> = state
        .offers
        .iter()
        .filter(|offer| offer.source == source && offer.inner_id == inner_id)
        .collect();
    Ok(Json(json!({ "result": result })))
}

fn change_id(state: &AppState, source: &str, params: &Params) -> Reply {
    let date: String = required(params, "date")?;
    if !is_iso_date(&date) {
        return Err(Failure::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "date must be in yyyy-mm-dd format",
        ));
    }
    // First change on or after the date; past the end of the feed, the id
    // the next change will get.
    let feed = source_changes(state, source);
    let change_id = match feed.iter().find(|change| change.date >= date) {
        Some(change) => change.change_id,
        None => feed.last().map_or(0, |last| last.change_id + 1),
    };
    Ok(Json(json!({ "change_id": change_id })))
}

fn changes(state: &AppState, source: &str, params: &Params) -> Reply {
    let change_id: i64 = required(params, "change_id")?;
    let pending: Vec<&Change> = source_changes(state, source)
        .into_iter()
        .filter(|change| change.change_id >= change_id)
        .collect();
    let result: Vec<&Change> = pending.iter().take(CHANGES_PAGE_SIZE).copied().collect();
    let next_change_id = match pending.get(CHANGES_PAGE_SIZE) {
        Some(next) => next.change_id,
        None => 0,
    };
    Ok(Json(json!({
        "result": result,
        "meta": { "cur_change_id": change_id, "next_change_id": next_change_id },
    })))
}

fn source_changes<'a>(state: &'a AppState, source: &str) -> Vec<&'a Change> {
    state
        .changes
        .iter()
        .filter(|change| {
            state
                .offers
                .iter()
                .any(|offer| offer.inner_id == change.inner_id && offer.source == source)
        })
        .collect()
}

fn required<T: std::str::FromStr>(params: &Params, key: &str) -> Result<T, Failure> {
    optional(params, key)?
        .ok_or_else(|| Failure::new(StatusCode::UNPROCESSABLE_ENTITY, format!("{key} is required")))
}

fn optional<T: std::str::FromStr>(params: &Params, key: &str) -> Result<Option<T>, Failure> {
    params
        .get(key)
        .map(|raw| {
            raw.parse()
                .map_err(|_| Failure::new(StatusCode::UNPROCESSABLE_ENTITY, format!("{key} is invalid")))
        })
        .transpose()
}

fn is_iso_date(date: &str) -> bool {
    let parts: Vec<&str> = date.split('-').collect();
    let digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    matches!(parts.as_slice(), [y, m, d] if digits(y, 4) && digits(m, 2) && digits(d, 2))
        && matches!(parts[1].parse::<u8>(), Ok(1..=12))
        && matches!(parts[2].parse::<u8>(), Ok(1..=31))
}

#[allow(clippy::too_many_arguments)]
fn offer_fixture(
    inner_id: &str,
    source: &str,
    mark: &str,
    model: &str,
    body_type: &str,
    engine_type: &str,
    year: u32,
    km_age: u64,
    price: u64,
    url: &str,
) -> Offer {
    Offer {
        inner_id: inner_id.to_string(),
        source: source.to_string(),
        data: OfferData {
            mark: mark.to_string(),
            model: model.to_string(),
            transmission: "automatic".to_string(),
            color: "white".to_string(),
            body_type: body_type.to_string(),
            engine_type: engine_type.to_string(),
            year,
            km_age,
            price,
            url: url.to_string(),
            seller_type: "dealer".to_string(),
            images: vec![format!("https://img.example.com/{inner_id}/1.jpg")],
        },
    }
}

fn encar_url(carid: &str) -> String {
    format!("https://www.encar.com/dc/dc_cardetailview.do?carid={carid}")
}

pub fn seed_offers() -> Vec<Offer> {
    vec![
        offer_fixture("40427050", "encar", "Hyundai", "Sonata", "sedan", "gasoline", 2021, 32_000, 21_500, &encar_url("40427050")),
        offer_fixture("40427051", "encar", "Hyundai", "Tucson", "suv", "diesel", 2022, 18_500, 27_900, &encar_url("40427051")),
        offer_fixture("40427052", "encar", "Hyundai", "Avante", "sedan", "gasoline", 2020, 54_000, 14_200, &encar_url("40427052")),
        offer_fixture("40427053", "encar", "Kia", "Sorento", "suv", "hybrid", 2023, 9_800, 38_400, &encar_url("40427053")),
        offer_fixture("40427054", "encar", "Genesis", "G80", "sedan", "gasoline", 2019, 71_000, 29_000, &encar_url("40427054")),
        offer_fixture("mde-1001", "mobile_de", "BMW", "X5", "suv", "diesel", 2021, 45_000, 45_000, "https://suchen.mobile.de/fahrzeuge/details.html?id=1001"),
        offer_fixture("mde-1002", "mobile_de", "Volkswagen", "Golf", "hatchback", "gasoline", 2018, 88_000, 12_900, "https://suchen.mobile.de/fahrzeuge/details.html?id=1002"),
    ]
}

pub fn seed_changes() -> Vec<Change> {
    let change = |change_id, inner_id: &str, change_type: &str, date: &str| Change {
        change_id,
        inner_id: inner_id.to_string(),
        change_type: change_type.to_string(),
        date: date.to_string(),
    };
    vec![
        change(42560, "40427050", "added", "2025-01-10"),
        change(42561, "mde-1001", "added", "2025-01-12"),
        change(42562, "40427051", "added", "2025-01-15"),
        change(42563, "40427050", "changed", "2025-01-15"),
        change(42564, "40427052", "added", "2025-01-16"),
        change(42565, "40427054", "removed", "2025-01-18"),
        change(42566, "40427053", "added", "2025-01-20"),
    ]
}
