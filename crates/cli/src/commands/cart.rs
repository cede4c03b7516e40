//! Cart commands.
//!
//! The cart lives in the data directory between runs when
//! `PLANTTAXA_PERSIST_CART` is on (the default).

#![allow(clippy::print_stdout)]

use planttaxa_core::ProductId;
use planttaxa_shop::error::Result;
use planttaxa_shop::state::AppState;

pub fn show(state: &AppState) {
    let cart = state.cart().snapshot();
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for line in cart.lines() {
        println!(
            "{:<26} {:<32} {} x {:>3} = {}",
            line.product_id,
            line.display_name,
            line.unit_price,
            line.quantity,
            line.line_total()
        );
    }
    println!("{} item(s), total {}", cart.item_count(), cart.total());
}

/// Add one of a catalog plant, snapshotting its current price and name.
pub async fn add(state: &AppState, product_id: &ProductId) -> Result<()> {
    let plant = state.api().find_plant(product_id).await?;
    state.cart().add_to_cart(plant.to_cart_product());

    let quantity = state
        .cart()
        .snapshot()
        .get(product_id)
        .map_or(0, |line| line.quantity);
    println!("Added {} (now {quantity} in cart).", plant.name);
    Ok(())
}

pub fn remove(state: &AppState, product_id: &ProductId) {
    state.cart().remove_from_cart(product_id);
    println!("Removed {product_id}.");
}

pub fn update(state: &AppState, product_id: &ProductId, quantity: u32) {
    state.cart().update_quantity(product_id, quantity);
    match state.cart().snapshot().get(product_id) {
        Some(line) => println!("{product_id} quantity is now {}.", line.quantity),
        None => println!("{product_id} is not in the cart."),
    }
}

pub fn clear(state: &AppState) {
    state.cart().clear_cart();
    println!("Cart cleared.");
}
