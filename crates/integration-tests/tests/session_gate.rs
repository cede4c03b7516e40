//! Integration tests for the session gate over file-backed storage.

#![allow(clippy::unwrap_used)]

use serde_json::json;

use planttaxa_integration_tests::{TestShop, token_expiring_in, token_with};
use planttaxa_shop::api::ProfileUpdate;
use planttaxa_shop::session::{Route, RouteDecision};

// =============================================================================
// Validity
// =============================================================================

#[tokio::test]
async fn test_valid_token_survives_restart() {
    let shop = TestShop::start().await.unwrap();
    shop.state
        .session()
        .store_token(&token_expiring_in("u1", 3_600))
        .unwrap();

    let reopened = shop.reopen().unwrap();
    assert!(reopened.session().is_authenticated());
    assert_eq!(
        reopened.session().current_user().unwrap().user_id().as_deref(),
        Some("u1")
    );
}

#[tokio::test]
async fn test_expired_token_is_removed_from_disk() {
    let shop = TestShop::start().await.unwrap();
    shop.state
        .session()
        .store_token(&token_expiring_in("u1", -60))
        .unwrap();
    assert!(shop.data_dir().join("token.json").exists());

    assert!(!shop.state.session().is_authenticated());
    assert!(shop.state.session().current_user().is_none());
    assert!(!shop.data_dir().join("token.json").exists());

    let reopened = shop.reopen().unwrap();
    assert!(reopened.session().token().is_none());
}

#[tokio::test]
async fn test_token_without_exp_is_invalid() {
    let shop = TestShop::start().await.unwrap();
    shop.state
        .session()
        .store_token(&token_with(&json!({ "id": "u1" })))
        .unwrap();

    assert!(shop.state.session().current_user().is_none());
    assert!(!shop.state.session().is_authenticated());
    assert!(shop.state.session().token().is_none());
}

// =============================================================================
// Route Guard
// =============================================================================

#[tokio::test]
async fn test_route_guard_follows_session() {
    let shop = TestShop::start().await.unwrap();
    let session = shop.state.session();

    for route in Route::ALL {
        let expected = if route.requires_auth() {
            RouteDecision::RedirectToLogin
        } else {
            RouteDecision::Allow
        };
        assert_eq!(session.enter(route), expected, "{route:?}");
    }

    session.store_token(&token_expiring_in("u1", 3_600)).unwrap();
    assert!(Route::ALL.iter().all(|route| session.enter(*route).is_allowed()));

    session.logout();
    assert_eq!(session.enter(Route::Profile), RouteDecision::RedirectToLogin);
}

#[tokio::test]
async fn test_logout_keeps_cart() {
    let shop = TestShop::start().await.unwrap();
    shop.state
        .session()
        .store_token(&token_expiring_in("u1", 3_600))
        .unwrap();
    shop.state.cart().add_to_cart(planttaxa_shop::cart::CartProduct {
        product_id: "A".into(),
        unit_price: planttaxa_core::Price::usd(rust_decimal::Decimal::TEN),
        display_name: "Aloe Vera".to_string(),
        image_ref: None,
    });

    shop.state.session().logout();
    assert_eq!(shop.state.cart().item_count(), 1);
}

// =============================================================================
// Profile
// =============================================================================

#[tokio::test]
async fn test_profile_update_round_trip() {
    let shop = TestShop::start().await.unwrap();
    let mock = shop
        .server
        .mock_async(|when, then| {
            when.method(httpmock::Method::PUT)
                .path("/api/profile")
                .json_body(json!({ "phone": "0300" }));
            then.status(200)
                .json_body(json!({ "name": "Fern Lover", "phone": "0300" }));
        })
        .await;
    shop.state
        .session()
        .store_token(&token_expiring_in("u1", 3_600))
        .unwrap();

    let update = ProfileUpdate {
        phone: Some("0300".to_string()),
        photo: None,
    };
    let profile = shop.state.update_profile(&update).await.unwrap();

    mock.assert_async().await;
    assert_eq!(profile.phone.as_deref(), Some("0300"));
}

#[tokio::test]
async fn test_rejected_profile_update_ends_session() {
    let shop = TestShop::start().await.unwrap();
    shop.server
        .mock_async(|when, then| {
            when.method(httpmock::Method::PUT).path("/api/profile");
            then.status(401).json_body(json!({ "msg": "Token is not valid" }));
        })
        .await;
    shop.state
        .session()
        .store_token(&token_expiring_in("u1", 3_600))
        .unwrap();

    let update = ProfileUpdate {
        phone: None,
        photo: Some("https://img/me.jpg".to_string()),
    };
    let err = shop.state.update_profile(&update).await.unwrap_err();

    assert!(err.user_message().contains("log in"));
    assert!(!shop.state.session().is_authenticated());
    assert!(!shop.data_dir().join("token.json").exists());
}
