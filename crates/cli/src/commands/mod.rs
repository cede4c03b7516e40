//! Command implementations.

#![allow(clippy::print_stdout, clippy::print_stderr)]

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod shop;

use planttaxa_shop::error::AppError;

/// Print the customer-facing side of a failure.
pub fn report(error: &AppError) {
    eprintln!("Error: {}", error.user_message());
    if matches!(error, AppError::Unauthorized(_)) {
        eprintln!("Run `pt-cli login` first.");
    } else if error.is_retryable() {
        eprintln!("You can run the same command again to retry.");
    }
}
