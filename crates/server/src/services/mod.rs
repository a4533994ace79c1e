//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `locations` - Location matching, search and per-user favorites
//! - `weather` - Provider lookups feeding the snapshot and forecast cache
//! - `gazetteer` - Built-in city table used for search and naming

pub mod auth;
pub mod gazetteer;
pub mod locations;
pub mod weather;

pub use auth::{AuthError, AuthService};
pub use locations::{LocationError, LocationService};
pub use weather::{ProviderError, SimulatedProvider, WeatherError, WeatherProvider, WeatherService};
