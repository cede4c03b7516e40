//! Catalog listing and single-plant orders.

#![allow(clippy::print_stdout)]

use planttaxa_core::ProductId;
use planttaxa_shop::api::search_catalog;
use planttaxa_shop::error::Result;
use planttaxa_shop::state::AppState;

/// Print the catalog, matches for `search` first.
pub async fn list(state: &AppState, search: Option<&str>) -> Result<()> {
    let plants = state.api().list_plants().await?;
    if plants.is_empty() {
        println!("No plants for sale right now.");
        return Ok(());
    }

    for plant in search_catalog(&plants, search.unwrap_or_default()) {
        match plant.price_pkr {
            Some(pkr) => println!("{:<26} {:<32} {} ({pkr})", plant.id, plant.name, plant.price),
            None => println!("{:<26} {:<32} {}", plant.id, plant.name, plant.price),
        }
    }
    Ok(())
}

/// Order one plant directly.
pub async fn buy(state: &AppState, product_id: &ProductId) -> Result<()> {
    let ack = state.buy_now(product_id).await?;
    println!(
        "{}",
        ack.message.as_deref().unwrap_or("Order placed successfully!")
    );
    if let Some(order_id) = ack.order_id {
        println!("Order id: {order_id}");
    }
    Ok(())
}
