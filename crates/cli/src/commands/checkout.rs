//! Order placement.

#![allow(clippy::print_stdout)]

use planttaxa_shop::error::Result;
use planttaxa_shop::session::Route;
use planttaxa_shop::state::AppState;

/// Submit the cart as an order after passing the checkout route guard.
pub async fn submit(state: &AppState, name: &str, address: &str) -> Result<()> {
    state.require(Route::Checkout)?;

    if state.cart().is_empty() {
        println!("Your cart is empty. Add plants with `pt-cli cart add`.");
        return Ok(());
    }

    let receipt = state.checkout().submit_order(name, address).await?;

    println!("{}", receipt.message);
    println!("Reference: {}", receipt.reference);
    if let Some(order_id) = &receipt.order_id {
        println!("Order id:  {order_id}");
    }
    println!(
        "{} line(s), {} item(s), total {}",
        receipt.line_count, receipt.item_count, receipt.total
    );
    Ok(())
}
