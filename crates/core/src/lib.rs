//! Shree Aura Core - Shared domain types.
//!
//! This crate provides the types used across the Shree Aura components:
//! - `storefront` - Public-facing grocery and beauty store
//! - `cli` - Operator tooling (session store migration, invoices)
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Cart math and fee rules live here so they
//! can be tested without a running server.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, phone numbers and statuses
//! - [`cart`] - Cart lines and quantity math
//! - [`fees`] - Shipping and handling fee schedule

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod fees;
pub mod types;

pub use cart::{Cart, CartError, CartItem};
pub use fees::{FeeSchedule, OrderTotals};
pub use types::*;
