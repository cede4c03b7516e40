//! Cart lines and immutable cart snapshots.

use serde::{Deserialize, Serialize};

use planttaxa_core::{Price, ProductId};

/// Product data captured when an item is added to the cart.
///
/// Supplied by the catalog; the cart trusts these values as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub product_id: ProductId,
    pub unit_price: Price,
    pub display_name: String,
    pub image_ref: Option<String>,
}

/// One product selected for purchase.
///
/// `unit_price` is snapshotted at add time and never re-read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub unit_price: Price,
    /// Always at least 1.
    pub quantity: u32,
    pub display_name: String,
    pub image_ref: Option<String>,
}

impl CartLine {
    pub(crate) fn new(product: CartProduct, quantity: u32) -> Self {
        Self {
            product_id: product.product_id,
            unit_price: product.unit_price,
            quantity,
            display_name: product.display_name,
            image_ref: product.image_ref,
        }
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// A consistent, owned view of the cart at one instant.
///
/// Lines are in insertion order. Totals are derived on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub(crate) const fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Consume the snapshot and return its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities, as shown on the cart badge.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(id: &str, price: i64, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            unit_price: Price::usd(Decimal::new(price, 0)),
            quantity,
            display_name: id.to_owned(),
            image_ref: None,
        }
    }

    #[test]
    fn test_total_and_item_count() {
        let cart = Cart::from_lines(vec![line("A", 10, 2), line("B", 5, 1)]);
        assert_eq!(cart.total(), Price::usd(Decimal::new(25, 0)));
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn test_empty_cart_total_is_zero() {
        let cart = Cart::default();
        assert!(cart.is_empty());
        assert_eq!(cart.total().amount, Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_get_finds_line() {
        let cart = Cart::from_lines(vec![line("A", 10, 2)]);
        assert_eq!(cart.get(&ProductId::new("A")).map(|l| l.quantity), Some(2));
        assert!(cart.get(&ProductId::new("Z")).is_none());
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line("A", 7, 3).line_total().amount, Decimal::new(21, 0));
    }
}
