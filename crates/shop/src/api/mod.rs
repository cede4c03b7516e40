//! Client for the PlantTaxa backend API.
//!
//! Covers the external collaborators the shop talks to: the auth endpoints
//! that issue session tokens, the plant catalog, the profile endpoint, and
//! order creation. The catalog is cached with `moka` for the configured TTL.

mod search;
mod types;

pub use search::search_catalog;
pub use types::{CatalogProduct, OrderAck, Profile, ProfileUpdate};

use std::sync::Arc;

use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use planttaxa_core::{Email, ProductId};

use crate::checkout::OrderSnapshot;
use crate::config::ShopConfig;
use types::{
    BuyRequest, LoginRequest, LoginResponse, OrderItem, OrderRequest, RawPlant,
    RegisterRequest, error_message,
};

const CATALOG_KEY: &str = "plants";
const USER_AGENT: &str = concat!("planttaxa/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    /// The backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The backend rejected the session token.
    #[error("Session expired")]
    SessionExpired,

    /// Input was rejected locally before any request was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A catalog product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The response body was not what the endpoint promises.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Whether the failure happened before a response was received.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// PlantTaxa backend client.
///
/// Cheap to clone; clones share the HTTP connection pool and catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    config: ShopConfig,
    catalog: Cache<&'static str, Arc<Vec<CatalogProduct>>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_url", &self.inner.config.api_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ShopConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let catalog = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.catalog_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                config: config.clone(),
                catalog,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.config.endpoint(path)?)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a session token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for blank or malformed input, and
    /// `ApiError::Api` carrying the backend's message when it refuses.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<SecretString, ApiError> {
        let email = parse_email(email)?;
        if password.expose_secret().is_empty() {
            return Err(ApiError::Validation("Password is required".to_string()));
        }

        let response = self
            .inner
            .client
            .post(self.endpoint("auth/login")?)
            .json(&LoginRequest {
                email: email.as_str(),
                password: password.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejection(status, response, "Login failed").await);
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        if body.token.is_empty() {
            return Err(ApiError::Parse("login response carried an empty token".to_string()));
        }

        debug!("Login accepted");
        Ok(SecretString::from(body.token))
    }

    /// Create a new account.
    ///
    /// Only `gmail.com` addresses are accepted.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for blank or malformed input, and
    /// `ApiError::Api` carrying the backend's message when it refuses.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<(), ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Name is required".to_string()));
        }
        let email = parse_email(email)?;
        if !email.is_gmail() {
            return Err(ApiError::Validation(
                "Only Gmail addresses are allowed".to_string(),
            ));
        }
        if password.expose_secret().is_empty() {
            return Err(ApiError::Validation("Password is required".to_string()));
        }

        let response = self
            .inner
            .client
            .post(self.endpoint("auth/register")?)
            .json(&RegisterRequest {
                name,
                email: email.as_str(),
                password: password.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejection(status, response, "Registration failed").await);
        }

        debug!("Registration accepted");
        Ok(())
    }

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionExpired` when the backend answers 401.
    #[instrument(skip(self, token))]
    pub async fn fetch_profile(&self, token: &SecretString) -> Result<Profile, ApiError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("profile")?)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            return Err(rejection(status, response, "Failed to load profile").await);
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Change the signed-in user's phone number or photo.
    ///
    /// Returns the profile as stored after the update.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when `update` is empty,
    /// `ApiError::SessionExpired` when the backend answers 401, and
    /// `ApiError::Api` carrying the backend's message when it refuses.
    #[instrument(skip(self, token, update))]
    pub async fn update_profile(
        &self,
        token: &SecretString,
        update: &ProfileUpdate,
    ) -> Result<Profile, ApiError> {
        if update.is_empty() {
            return Err(ApiError::Validation("Nothing to update".to_string()));
        }

        let response = self
            .inner
            .client
            .put(self.endpoint("profile")?)
            .bearer_auth(token.expose_secret())
            .json(update)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            return Err(rejection(status, response, "Update failed").await);
        }

        debug!("Profile updated");
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// All purchasable plants, in backend order.
    ///
    /// Records without a usable price are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a plant list.
    #[instrument(skip(self))]
    pub async fn list_plants(&self) -> Result<Arc<Vec<CatalogProduct>>, ApiError> {
        if let Some(plants) = self.inner.catalog.get(CATALOG_KEY).await {
            debug!("Cache hit for catalog");
            return Ok(plants);
        }

        let response = self
            .inner
            .client
            .get(self.endpoint("plants")?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejection(status, response, "Failed to load plants").await);
        }

        let raw: Vec<RawPlant> = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        let plants: Vec<CatalogProduct> = raw
            .into_iter()
            .filter_map(|plant| {
                let id = plant.id.clone();
                let product = CatalogProduct::from_raw(plant);
                if product.is_none() {
                    tracing::warn!(product_id = %id, "Skipping plant without a price");
                }
                product
            })
            .collect();

        debug!(count = plants.len(), "Loaded catalog");
        let plants = Arc::new(plants);
        self.inner
            .catalog
            .insert(CATALOG_KEY, Arc::clone(&plants))
            .await;
        Ok(plants)
    }

    /// Look a single plant up in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ProductNotFound` if no plant has `product_id`.
    pub async fn find_plant(&self, product_id: &ProductId) -> Result<CatalogProduct, ApiError> {
        self.list_plants()
            .await?
            .iter()
            .find(|plant| &plant.id == product_id)
            .cloned()
            .ok_or_else(|| ApiError::ProductNotFound(product_id.clone()))
    }

    /// Drop the cached catalog so the next read refetches it.
    pub async fn invalidate_catalog(&self) {
        self.inner.catalog.invalidate(CATALOG_KEY).await;
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Submit an order snapshot.
    ///
    /// Sends exactly one request. The snapshot's reference doubles as the
    /// `Idempotency-Key` header.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` when no response arrived and `ApiError::Api`
    /// when the backend rejected the order.
    #[instrument(skip(self, order, token), fields(reference = %order.reference, lines = order.lines.len()))]
    pub async fn create_order(
        &self,
        order: &OrderSnapshot,
        token: Option<&SecretString>,
    ) -> Result<OrderAck, ApiError> {
        let body = OrderRequest {
            items: order.lines.iter().map(OrderItem::from).collect(),
            name: &order.customer_name,
            address: &order.shipping_address,
            reference: order.reference,
        };

        let mut request = self
            .inner
            .client
            .post(self.endpoint("orders")?)
            .header("Idempotency-Key", order.reference.to_string())
            .json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            return Err(rejection(status, response, "Order failed").await);
        }

        let text = response.text().await.unwrap_or_default();
        Ok(OrderAck::from_body(&text))
    }

    /// Order a single plant directly, bypassing the cart.
    ///
    /// Sends exactly one request with the plant id as the only payload.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionExpired` when the backend answers 401 and
    /// `ApiError::Api` when it rejects the order.
    #[instrument(skip(self, token))]
    pub async fn buy_plant(
        &self,
        plant_id: &ProductId,
        token: Option<&SecretString>,
    ) -> Result<OrderAck, ApiError> {
        let mut request = self
            .inner
            .client
            .post(self.endpoint("orders")?)
            .json(&BuyRequest { plant_id });
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            return Err(rejection(status, response, "Order failed").await);
        }

        let text = response.text().await.unwrap_or_default();
        Ok(OrderAck::from_body(&text))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_email(raw: &str) -> Result<Email, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::Validation("Email is required".to_string()));
    }
    Email::parse(raw).map_err(|e| ApiError::Validation(e.to_string()))
}

/// Turn a non-success response into `ApiError::Api`, preferring the
/// backend's own message over `fallback`.
async fn rejection(status: StatusCode, response: reqwest::Response, fallback: &str) -> ApiError {
    let body = response.text().await.unwrap_or_default();
    ApiError::Api {
        status: status.as_u16(),
        message: error_message(&body).unwrap_or_else(|| fallback.to_string()),
    }
}
