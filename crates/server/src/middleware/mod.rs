//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (reuse or mint `x-request-id`)
//! 4. Session layer (tower-sessions, memory or `PostgreSQL` store)
//!
//! Authentication is not a layer: handlers opt in with the [`RequireAuth`]
//! and [`OptionalAuth`] extractors.

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
