//! Catalog filtering for the plant shop page.

use super::CatalogProduct;

/// Order `products` for display against a search `term`.
///
/// Nothing is hidden: plants whose name contains `term` (case-insensitive)
/// come first, the rest follow, and each group keeps catalog order. A blank
/// term returns the catalog as-is.
#[must_use]
pub fn search_catalog<'a>(products: &'a [CatalogProduct], term: &str) -> Vec<&'a CatalogProduct> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return products.iter().collect();
    }

    let (mut matches, rest): (Vec<_>, Vec<_>) = products
        .iter()
        .partition(|product| product.name.to_lowercase().contains(&term));
    matches.extend(rest);
    matches
}
