//! Core types for Nimbus.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod coordinates;
pub mod email;
pub mod id;
pub mod location;
pub mod username;
pub mod weather;

pub use coordinates::{
    COORDINATE_TOLERANCE, CoordinateError, Coordinates, MATCH_THRESHOLD, TOLERANCE_EPSILON,
};
pub use email::{Email, EmailError};
pub use id::*;
pub use location::{LocalFavorite, Location, NewLocation, find_nearest};
pub use username::{Username, UsernameError};
pub use weather::{
    ForecastDay, ForecastSample, MAX_FORECAST_DAYS, StoredForecastDay, WeatherReading,
    WeatherSnapshot, aggregate_forecast,
};
