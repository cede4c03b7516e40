//! Order submission.
//!
//! [`Checkout`] turns the current cart plus the customer's shipping details
//! into a single order request and reconciles local state with the outcome:
//! the cart is cleared only once the backend has accepted the order.
//!
//! There is no automatic retry. A failed submission leaves the cart intact
//! so the customer can submit again; each attempt carries a new
//! [`OrderReference`], so a retry after an ambiguous failure may create a
//! second order on the backend.

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use secrecy::SecretString;
use thiserror::Error;
use tracing::instrument;

use planttaxa_core::{OrderReference, Price, SubmissionStatus};

use crate::api::{ApiClient, ApiError, OrderAck};
use crate::cart::{CartLine, CartStore};
use crate::session::SessionGate;

const DEFAULT_CONFIRMATION: &str = "Order placed successfully!";

/// Errors from [`Checkout::submit_order`].
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A required shipping field was blank. No request was made.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The order request failed or was rejected.
    #[error("Order submission failed: {0}")]
    Submission(#[from] ApiError),
}

/// Immutable copy of the cart and shipping details sent with one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSnapshot {
    pub reference: OrderReference,
    pub lines: Vec<CartLine>,
    pub customer_name: String,
    pub shipping_address: String,
}

impl OrderSnapshot {
    /// Sum of line totals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

/// Outcome of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub reference: OrderReference,
    /// Backend-assigned id, when the backend reports one.
    pub order_id: Option<String>,
    pub line_count: usize,
    pub item_count: u64,
    pub total: Price,
    /// Confirmation to show the customer.
    pub message: String,
}

/// The order-creation collaborator.
pub trait OrderGateway: Send + Sync {
    /// Send one order. Implementations must not retry.
    fn create_order(
        &self,
        order: &OrderSnapshot,
        token: Option<&SecretString>,
    ) -> impl Future<Output = Result<OrderAck, ApiError>> + Send;
}

impl OrderGateway for ApiClient {
    fn create_order(
        &self,
        order: &OrderSnapshot,
        token: Option<&SecretString>,
    ) -> impl Future<Output = Result<OrderAck, ApiError>> + Send {
        Self::create_order(self, order, token)
    }
}

/// Order submission flow over a cart, a session, and a gateway.
pub struct Checkout<G> {
    cart: CartStore,
    session: SessionGate,
    gateway: G,
    status: RwLock<SubmissionStatus>,
}

impl<G: std::fmt::Debug> std::fmt::Debug for Checkout<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkout")
            .field("status", &*self.status.read().unwrap_or_else(PoisonError::into_inner))
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

impl<G: OrderGateway> Checkout<G> {
    /// Create an idle checkout.
    #[must_use]
    pub const fn new(cart: CartStore, session: SessionGate, gateway: G) -> Self {
        Self {
            cart,
            session,
            gateway,
            status: RwLock::new(SubmissionStatus::Idle),
        }
    }

    /// Where the most recent submission stands.
    #[must_use]
    pub fn status(&self) -> SubmissionStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Submit the current cart as an order.
    ///
    /// Blank `customer_name` or `shipping_address` fails before any request.
    /// An empty cart is passed through as an order with no lines. On success
    /// the cart is cleared; on failure it is left exactly as it was. A 401
    /// from the backend also ends the local session.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingField` for blank input and
    /// `CheckoutError::Submission` when the request fails or is rejected.
    #[instrument(skip(self, customer_name, shipping_address))]
    pub async fn submit_order(
        &self,
        customer_name: &str,
        shipping_address: &str,
    ) -> Result<OrderReceipt, CheckoutError> {
        let customer_name = required("Name", customer_name)?;
        let shipping_address = required("Address", shipping_address)?;

        let cart = self.cart.snapshot();
        let snapshot = OrderSnapshot {
            reference: OrderReference::generate(),
            lines: cart.lines().to_vec(),
            customer_name: customer_name.to_string(),
            shipping_address: shipping_address.to_string(),
        };
        let token = self.session.token();

        self.set_status(SubmissionStatus::Submitting);
        tracing::debug!(reference = %snapshot.reference, "Submitting order");

        match self.gateway.create_order(&snapshot, token.as_ref()).await {
            Ok(ack) => {
                self.cart.clear_cart();
                self.set_status(SubmissionStatus::Placed);
                tracing::info!(
                    reference = %snapshot.reference,
                    lines = snapshot.lines.len(),
                    "Order placed"
                );

                Ok(OrderReceipt {
                    reference: snapshot.reference,
                    order_id: ack.order_id,
                    line_count: snapshot.lines.len(),
                    item_count: cart.item_count(),
                    total: snapshot.total(),
                    message: ack
                        .message
                        .unwrap_or_else(|| DEFAULT_CONFIRMATION.to_string()),
                })
            }
            Err(e) => {
                self.set_status(SubmissionStatus::Failed);
                tracing::error!(reference = %snapshot.reference, error = %e, "Order failed");
                if matches!(e, ApiError::SessionExpired) {
                    self.session.logout();
                }
                Err(e.into())
            }
        }
    }

    fn set_status(&self, status: SubmissionStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, CheckoutError> {
    let value = value.trim();
    if value.is_empty() {
        Err(CheckoutError::MissingField(field))
    } else {
        Ok(value)
    }
}
