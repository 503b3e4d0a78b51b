//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, `PostgreSQL` store in production)
//! 5. Session expiry (logs out customers whose token the backend rejects)
//! 6. Rate limiting on OTP and cart routes (governor)
//!
//! Extractors (`RequireAuth`, `OptionalAuth`, `PageContext`) read the session
//! set up by the session layer.

pub mod auth;
pub mod page;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAuth, SessionExpired, clear_current_customer, current_path, login_url,
    safe_next, session_expiry_middleware, set_current_customer,
};
pub use page::PageContext;
pub use rate_limit::{cart_rate_limiter, otp_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use session::create_session_layer;
