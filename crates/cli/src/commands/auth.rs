//! Account and session commands.
//!
//! # Usage
//!
//! ```bash
//! pt-cli register -n "Fern Lover" -e fern@gmail.com -p hunter2
//! pt-cli login -e fern@gmail.com -p hunter2
//! pt-cli whoami
//! pt-cli profile
//! pt-cli update-profile --phone "0300 1234567"
//! pt-cli logout
//! ```

#![allow(clippy::print_stdout)]

use secrecy::SecretString;

use planttaxa_shop::api::{Profile, ProfileUpdate};
use planttaxa_shop::error::Result;
use planttaxa_shop::state::AppState;

/// Create an account. Does not sign in.
pub async fn register(state: &AppState, name: &str, email: &str, password: &SecretString) -> Result<()> {
    state.api().register(name, email, password).await?;
    println!("Registered {email}. Log in with `pt-cli login`.");
    Ok(())
}

/// Sign in and store the session token.
pub async fn login(state: &AppState, email: &str, password: &SecretString) -> Result<()> {
    state.login(email, password).await?;
    println!("Logged in as {email}.");
    Ok(())
}

pub fn logout(state: &AppState) {
    state.session().logout();
    println!("Logged out.");
}

/// Print the stored session's claims.
pub fn whoami(state: &AppState) {
    if !state.session().is_authenticated() {
        println!("Not logged in.");
        return;
    }

    let Some(claims) = state.session().current_user() else {
        println!("Not logged in.");
        return;
    };

    let who = claims
        .name
        .as_deref()
        .or(claims.email.as_deref())
        .map_or_else(|| claims.user_id().unwrap_or_else(|| "unknown user".to_string()), str::to_string);
    println!("Logged in as {who}.");
    if let Some(expires_at) = claims.expires_at() {
        println!("Session expires at {}.", expires_at.to_rfc3339());
    }
}

/// Print the signed-in user's profile.
pub async fn profile(state: &AppState) -> Result<()> {
    print_profile(state.profile().await?);
    Ok(())
}

/// Send a profile change and print the result.
pub async fn update_profile(state: &AppState, update: ProfileUpdate) -> Result<()> {
    let profile = state.update_profile(&update).await?;
    println!("Profile updated.");
    print_profile(profile);
    Ok(())
}

fn print_profile(profile: Profile) {
    let unset = || "-".to_string();

    println!("Name:  {}", profile.name.unwrap_or_else(unset));
    println!("Email: {}", profile.email.unwrap_or_else(unset));
    println!("Phone: {}", profile.phone.unwrap_or_else(unset));
    println!("Photo: {}", profile.photo.map_or_else(unset, |_| "set".to_string()));
}
