//! PlantTaxa Core - Shared domain types.
//!
//! This crate provides the types used across all PlantTaxa components:
//! - `shop` - Cart store, order submission, and session gate
//! - `cli` - Command-line front end for the plant shop
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, order references, prices,
//!   emails, and submission statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
