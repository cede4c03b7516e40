//! Pages of the application and which of them require a session.

use serde::{Deserialize, Serialize};

/// A navigable page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Home,
    Login,
    Register,
    Shop,
    Cart,
    Checkout,
    Dashboard,
    Profile,
    Identify,
    DiseaseDetect,
    ChatBot,
    About,
    Contact,
    Forum,
    ClimateAdvice,
}

impl Route {
    /// Every route, in navigation order.
    pub const ALL: [Self; 15] = [
        Self::Home,
        Self::Login,
        Self::Register,
        Self::Shop,
        Self::Cart,
        Self::Checkout,
        Self::Dashboard,
        Self::Profile,
        Self::Identify,
        Self::DiseaseDetect,
        Self::ChatBot,
        Self::About,
        Self::Contact,
        Self::Forum,
        Self::ClimateAdvice,
    ];

    /// Whether entering this route needs a valid session.
    #[must_use]
    pub const fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Self::Home | Self::Login | Self::Register | Self::Shop | Self::Cart
        )
    }

    /// URL path of the page.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Shop => "/shop",
            Self::Cart => "/cart",
            Self::Checkout => "/checkout",
            Self::Dashboard => "/dashboard",
            Self::Profile => "/profile",
            Self::Identify => "/identify",
            Self::DiseaseDetect => "/disease-detect",
            Self::ChatBot => "/chatbot",
            Self::About => "/about",
            Self::Contact => "/contact",
            Self::Forum => "/forum",
            Self::ClimateAdvice => "/climate-advice",
        }
    }
}

/// Outcome of trying to enter a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the requested page.
    Allow,
    /// Send the user to the login page instead.
    RedirectToLogin,
}

impl RouteDecision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes() {
        for route in [
            Route::Home,
            Route::Login,
            Route::Register,
            Route::Shop,
            Route::Cart,
        ] {
            assert!(!route.requires_auth(), "{route:?} should be public");
        }
    }

    #[test]
    fn test_protected_routes() {
        for route in [
            Route::Checkout,
            Route::Dashboard,
            Route::Profile,
            Route::Forum,
            Route::ClimateAdvice,
        ] {
            assert!(route.requires_auth(), "{route:?} should be protected");
        }
    }

    #[test]
    fn test_paths_are_unique() {
        let mut paths: Vec<_> = Route::ALL.iter().map(Route::path).collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), Route::ALL.len());
    }
}
