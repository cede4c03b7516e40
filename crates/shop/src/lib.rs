//! PlantTaxa shop library.
//!
//! The client-side core of the PlantTaxa plant shop: the cart store, the
//! order submission flow, and the session gate that guards protected pages,
//! plus the backend client and storage they are wired to.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod storage;
