//! Wire types for the PlantTaxa backend API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use planttaxa_core::{CurrencyCode, OrderReference, Price, ProductId};

use crate::cart::{CartLine, CartProduct};

// =============================================================================
// Catalog
// =============================================================================

/// A plant as returned by `GET /plants`.
///
/// The backend has two shapes for the same record (`price`/`image` on the
/// older shop pages, `priceUSD`/`imageUrl` on the plant shop), so every
/// field is optional here and reconciled in [`CatalogProduct::from_raw`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawPlant {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default, rename = "priceUSD")]
    pub price_usd: Option<Decimal>,
    #[serde(default, rename = "pricePKR")]
    pub price_pkr: Option<Decimal>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A purchasable plant from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    /// USD price used for the cart.
    pub price: Price,
    /// Price in Pakistani rupees, shown alongside when the backend has one.
    pub price_pkr: Option<Price>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl CatalogProduct {
    /// Reconcile a raw record; `None` if it carries no usable price.
    pub(crate) fn from_raw(raw: RawPlant) -> Option<Self> {
        let price = Price::usd(raw.price_usd.or(raw.price)?);
        if price.is_negative() {
            return None;
        }

        Some(Self {
            id: raw.id,
            name: raw.name,
            price,
            price_pkr: raw
                .price_pkr
                .map(|amount| Price::new(amount, CurrencyCode::PKR)),
            image_url: raw.image_url.or(raw.image),
            description: raw.description,
        })
    }

    /// The data the cart snapshots when this plant is added.
    #[must_use]
    pub fn to_cart_product(&self) -> CartProduct {
        CartProduct {
            product_id: self.id.clone(),
            unit_price: self.price,
            display_name: self.name.clone(),
            image_ref: self.image_url.clone(),
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
}

/// The signed-in user's profile from `GET /profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

/// Body of `PUT /profile`. Absent fields are left unchanged by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Image URL or `data:` URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl ProfileUpdate {
    /// Whether there is nothing to send.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.phone.is_none() && self.photo.is_none()
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Body of a single-plant `POST /orders`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BuyRequest<'a> {
    pub plant_id: &'a ProductId,
}

/// One order line on the wire, in the backend's product shape plus `qty`.
#[derive(Debug, Serialize)]
pub(crate) struct OrderItem<'a> {
    #[serde(rename = "_id")]
    pub id: &'a ProductId,
    pub name: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<&'a str>,
    pub qty: u32,
}

impl<'a> From<&'a CartLine> for OrderItem<'a> {
    fn from(line: &'a CartLine) -> Self {
        Self {
            id: &line.product_id,
            name: &line.display_name,
            price: line.unit_price.amount,
            image: line.image_ref.as_deref(),
            qty: line.quantity,
        }
    }
}

/// Body of `POST /orders`.
#[derive(Debug, Serialize)]
pub(crate) struct OrderRequest<'a> {
    pub items: Vec<OrderItem<'a>>,
    pub name: &'a str,
    pub address: &'a str,
    pub reference: OrderReference,
}

/// The backend's acknowledgement of an accepted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderAck {
    /// Backend-assigned order id, if reported.
    pub order_id: Option<String>,
    /// Human-readable confirmation, if reported.
    pub message: Option<String>,
}

impl OrderAck {
    /// Read an acknowledgement out of an arbitrary (possibly empty) JSON body.
    pub(crate) fn from_body(body: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(body) else {
            return Self::default();
        };

        let text = |keys: &[&str]| {
            keys.iter().find_map(|key| match value.get(*key)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        };

        Self {
            order_id: text(&["orderId", "_id", "id"]),
            message: text(&["msg", "message"]),
        }
    }
}

/// Pull a human-readable error out of a backend error body.
///
/// The backend uses `msg` for auth failures and `error` elsewhere.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["msg", "error", "message"]
        .iter()
        .find_map(|key| value.get(*key)?.as_str().map(str::to_owned))
        .filter(|message| !message.trim().is_empty())
}
