//! Domain models for the server.
//!
//! Location and weather records live in `nimbus_core` because the client
//! shares them. The types here never leave the server.

pub mod session;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, User};
