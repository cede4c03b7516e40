//! Integration tests for PlantTaxa.
//!
//! Each test runs the shop against an `httpmock` backend and a throwaway
//! data directory, so no real server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p planttaxa-integration-tests
//! ```

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use httpmock::MockServer;
use serde_json::{Value, json};
use tempfile::TempDir;

use planttaxa_shop::config::ShopConfig;
use planttaxa_shop::error::AppError;
use planttaxa_shop::state::AppState;

/// A shop wired to a mock backend and a temporary data directory.
pub struct TestShop {
    pub server: MockServer,
    pub state: AppState,
    dir: TempDir,
}

impl TestShop {
    /// Start a mock backend and build state over a fresh data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or state cannot be created.
    pub async fn start() -> Result<Self, AppError> {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().map_err(|e| AppError::Storage(e.into()))?;
        let state = AppState::new(config_for(&server, dir.path())?)?;
        Ok(Self { server, state, dir })
    }

    /// Build a second state over the same backend and data directory,
    /// as a new process would.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be created.
    pub fn reopen(&self) -> Result<AppState, AppError> {
        AppState::new(config_for(&self.server, self.dir.path())?)
    }

    /// The data directory backing this shop.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }
}

fn config_for(server: &MockServer, data_dir: &Path) -> Result<ShopConfig, AppError> {
    let api_url = server.url("/api");
    let data_dir = data_dir.display().to_string();
    Ok(ShopConfig::from_lookup(|key| match key {
        "PLANTTAXA_API_URL" => Some(api_url.clone()),
        "PLANTTAXA_DATA_DIR" => Some(data_dir.clone()),
        _ => None,
    })?)
}

/// An unsigned token carrying `payload` as its claims.
#[must_use]
pub fn token_with(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

/// A token for user `id` expiring `secs` from now (negative for the past).
#[must_use]
pub fn token_expiring_in(id: &str, secs: i64) -> String {
    token_with(&json!({
        "id": id,
        "name": "Fern Lover",
        "email": "fern@gmail.com",
        "iat": Utc::now().timestamp(),
        "exp": Utc::now().timestamp() + secs,
    }))
}

/// The backend's `/plants` reply used across tests.
#[must_use]
pub fn sample_catalog() -> Value {
    json!([
        { "_id": "A", "name": "Aloe Vera", "price": 10, "image": "aloe.jpg" },
        { "_id": "B", "name": "Boston Fern", "priceUSD": 5, "imageUrl": "fern.jpg" },
        { "_id": "C", "name": "Snake Plant", "priceUSD": 12.5, "pricePKR": 3500 },
    ])
}
