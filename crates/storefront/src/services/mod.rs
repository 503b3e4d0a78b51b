//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Phone + OTP login and token claims
//! - `checkout` - Order placement and payment confirmation

pub mod auth;
pub mod checkout;
