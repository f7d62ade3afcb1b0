//! Walk through every endpoint against the live API (or the mock server).
//!
//! ```text
//! AUTO_API_KEY=your-api-key cargo run -p auto-api --example usage
//! AUTO_API_KEY=test-key AUTO_API_BASE_URL=http://127.0.0.1:3000 cargo run -p auto-api --example usage
//! ```

use auto_api::{ApiError, BlockingClient, ClientConfig, OffersQuery};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const SOURCE: &str = "encar";

fn main() -> Result<(), ApiError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("auto_api=info")))
        .compact()
        .init();

    let config = ClientConfig::from_env()?;
    let client = BlockingClient::from_config(config.clone());

    // --- Filters ---
    let filters = client.get_filters(SOURCE)?;
    let keys = filters.as_object().map_or(0, |map| map.len());
    println!("Filter keys: {keys}");

    // --- Offers, with one pagination step ---
    let query = OffersQuery {
        brand: Some("Hyundai".to_string()),
        year_from: Some(2020),
        price_to: Some(50_000),
        ..OffersQuery::new(1)
    };
    let offers = client.get_offers(SOURCE, &query)?;
    println!("\n--- Offers (page {}) ---", offers["meta"]["page"]);
    for item in items(&offers) {
        let data = &item["data"];
        println!(
            "{} {} {} - ${} ({} km)",
            text(&data["mark"]),
            text(&data["model"]),
            data["year"],
            data["price"],
            data["km_age"]
        );
    }

    let next_page = offers["meta"]["next_page"].as_u64().unwrap_or(0);
    if next_page > 0 {
        let page = u32::try_from(next_page).unwrap_or(u32::MAX);
        let more = client.get_offers(SOURCE, &OffersQuery { page, ..query.clone() })?;
        println!("Next page has {} offers", items(&more).len());
    }

    // --- Single offer ---
    let inner_id = items(&offers)
        .first()
        .and_then(|item| item["inner_id"].as_str())
        .unwrap_or("40427050")
        .to_string();
    let offer = client.get_offer(SOURCE, &inner_id)?;
    println!("\n--- Single offer ---");
    if let Some(first) = items(&offer).first() {
        let data = &first["data"];
        println!("URL: {}", text(&data["url"]));
        println!("Seller: {}", text(&data["seller_type"]));
        println!("Images: {}", data["images"].as_array().map_or(0, Vec::len));
    }

    // --- Change feed ---
    let change_id = client.get_change_id(SOURCE, "2025-01-15")?;
    println!("\n--- Changes from 2025-01-15 (change_id: {change_id}) ---");
    let changes = client.get_changes(SOURCE, change_id)?;
    for change in items(&changes) {
        println!("[{}] {}", text(&change["change_type"]), text(&change["inner_id"]));
    }
    let next_change_id = changes["meta"]["next_change_id"].as_i64().unwrap_or(0);
    if next_change_id > 0 {
        let more = client.get_changes(SOURCE, next_change_id)?;
        println!("Next batch: {} changes", items(&more).len());
    }

    // --- Offer by URL ---
    let info = client.get_offer_by_url("https://www.encar.com/dc/dc_cardetailview.do?carid=40427050")?;
    println!("\n--- Offer by URL ---");
    println!("{} {} - ${}", text(&info["mark"]), text(&info["model"]), info["price"]);

    // --- Error handling ---
    let bad_client = BlockingClient::from_config(
        ClientConfig::new("invalid-key")
            .with_api_version(config.api_version())
            .with_base_url(config.base_url()),
    );
    match bad_client.get_offers(SOURCE, &OffersQuery::new(1)) {
        Err(err) if err.is_auth() => {
            println!("\nAuth error: {err} (HTTP {})", err.status().unwrap_or_default());
        }
        Err(err) => {
            println!("\nAPI error: {err}");
            if let Some(body) = err.response_body() {
                println!("Body: {body}");
            }
        }
        Ok(_) => println!("\nUnexpectedly accepted an invalid key"),
    }

    Ok(())
}

fn items(value: &Value) -> &[Value] {
    value["result"].as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn text(value: &Value) -> &str {
    value.as_str().unwrap_or("-")
}
