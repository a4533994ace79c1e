//! Nimbus Client - headless dashboard client.
//!
//! Talks to the Nimbus server over its `/api` REST surface and holds the
//! client-side pieces of the dashboard:
//!
//! - [`api`] - `ApiClient` with a session cookie store, and the `WeatherApi`
//!   seam used by the dashboard
//! - [`session`] - `DashboardSession` state machine with stale-result
//!   discarding
//! - [`geolocation`] - device lookup with a timeout and the San Francisco
//!   fallback
//! - [`favorites`] - account and local favorites behind one trait
//! - [`storage`] - file-backed `localStorage` equivalent
//! - [`config`] - base URL and timeout

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod favorites;
pub mod geolocation;
pub mod session;
pub mod storage;

pub use api::{ApiClient, WeatherApi};
pub use config::ClientConfig;
pub use error::ClientError;
pub use favorites::{
    FavoriteHandle, FavoriteView, FavoritesBackend, LocalFavorites, RemoteFavorites,
    select_backend,
};
pub use geolocation::{
    FixedGeolocator, GEOLOCATION_TIMEOUT, GeolocationError, Geolocator, Located, NoGeolocator,
    SelectedLocation, locate_or_fallback,
};
pub use session::{
    Dashboard, DashboardSession, FetchOutcome, FetchTicket, SessionState, fetch_dashboard,
};
pub use storage::LocalStorage;
