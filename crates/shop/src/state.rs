//! Application state shared across front-end handlers.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use planttaxa_core::ProductId;

use crate::api::{ApiClient, ApiError, OrderAck, Profile, ProfileUpdate};
use crate::cart::CartStore;
use crate::checkout::Checkout;
use crate::config::ShopConfig;
use crate::error::{AppError, Result};
use crate::session::{Route, SessionGate};
use crate::storage::{FileStore, KeyValueStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and owns the cart store, the
/// session gate, and the backend client for one user session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ShopConfig,
    cart: CartStore,
    session: SessionGate,
    api: ApiClient,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cart", &self.inner.cart)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create state backed by a [`FileStore`] in the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the HTTP
    /// client fails to build.
    pub fn new(config: ShopConfig) -> Result<Self> {
        let storage = FileStore::open(config.data_dir.clone())?;
        Self::with_storage(config, Arc::new(storage))
    }

    /// Create state over an arbitrary key-value store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_storage(config: ShopConfig, storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let cart = if config.persist_cart {
            CartStore::with_storage(Arc::clone(&storage), config.zero_quantity)
        } else {
            CartStore::new(config.zero_quantity)
        };
        let session = SessionGate::new(storage);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                cart,
                session,
                api,
            }),
        })
    }

    /// Get a reference to the shop configuration.
    #[must_use]
    pub fn config(&self) -> &ShopConfig {
        &self.inner.config
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the session gate.
    #[must_use]
    pub fn session(&self) -> &SessionGate {
        &self.inner.session
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// A checkout over this state's cart and session.
    #[must_use]
    pub fn checkout(&self) -> Checkout<ApiClient> {
        Checkout::new(
            self.inner.cart.clone(),
            self.inner.session.clone(),
            self.inner.api.clone(),
        )
    }

    /// Log in and keep the issued token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses or the token cannot be stored.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<()> {
        let token = self.inner.api.login(email, password).await?;
        self.inner.session.store_token(token.expose_secret())?;
        tracing::info!("Logged in");
        Ok(())
    }

    /// Enter a protected route or fail with `AppError::Unauthorized`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when the session gate redirects.
    pub fn require(&self, route: Route) -> Result<()> {
        if self.inner.session.enter(route).is_allowed() {
            Ok(())
        } else {
            Err(AppError::Unauthorized(route.path().to_string()))
        }
    }

    /// Load the profile of the signed-in user.
    ///
    /// A 401 from the backend ends the local session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` without a valid session, or the
    /// backend error.
    pub async fn profile(&self) -> Result<Profile> {
        let token = self.bearer_for(Route::Profile)?;
        let profile = self.inner.api.fetch_profile(&token).await;
        Ok(self.end_session_on_expiry(profile)?)
    }

    /// Change the signed-in user's phone number or photo.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` when `update` changes nothing,
    /// `AppError::Unauthorized` without a valid session, or the backend error.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile> {
        if update.is_empty() {
            return Err(AppError::BadRequest(
                "Give a phone number or a photo to update".to_string(),
            ));
        }
        let token = self.bearer_for(Route::Profile)?;
        let profile = self.inner.api.update_profile(&token, update).await;
        let profile = self.end_session_on_expiry(profile)?;
        tracing::info!("Profile updated");
        Ok(profile)
    }

    /// Order one unit of a catalog plant directly, leaving the cart alone.
    ///
    /// The session token is sent when there is one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ProductNotFound` for a plant not in the catalog, or
    /// the backend error.
    pub async fn buy_now(&self, product_id: &ProductId) -> Result<OrderAck> {
        let plant = self.inner.api.find_plant(product_id).await?;
        let token = self.inner.session.token();
        let ack = self.inner.api.buy_plant(&plant.id, token.as_ref()).await;
        let ack = self.end_session_on_expiry(ack)?;
        tracing::info!(product_id = %plant.id, "Plant ordered");
        Ok(ack)
    }

    fn bearer_for(&self, route: Route) -> Result<SecretString> {
        self.require(route)?;
        self.inner
            .session
            .bearer()
            .ok_or_else(|| AppError::Unauthorized(route.path().to_string()))
    }

    // A 401 from the backend ends the local session.
    fn end_session_on_expiry<T>(
        &self,
        result: std::result::Result<T, ApiError>,
    ) -> std::result::Result<T, ApiError> {
        if matches!(result, Err(ApiError::SessionExpired)) {
            self.inner.session.logout();
        }
        result
    }
}
