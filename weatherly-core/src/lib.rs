//! Core library for the `weatherly` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider client (current conditions, 5-day forecast)
//! - Daily forecast aggregation
//! - The hosted favorites store and its auth session
//! - Shared domain models and error types
//!
//! It is used by `weatherly-cli`, but can also be reused by other front ends.

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod favorites;
pub mod forecast;
pub mod location;
pub mod model;
pub mod provider;

pub use auth::{AuthClient, Session, SignUpOutcome};
pub use config::{BackendEndpoint, Config};
pub use dashboard::{Dashboard, FavoriteWeather};
pub use error::{AuthError, LocationError, StoreError, WeatherError};
pub use favorites::{AddOutcome, FavoritesStore, RestFavoritesStore};
pub use forecast::{daily_summaries, daily_summaries_local};
pub use location::{IpLocationProvider, LocationProvider};
pub use model::{
    Condition, Coordinates, DailySummary, FavoriteCity, ForecastEntry, ForecastReport,
    WeatherReading,
};
pub use provider::{WeatherProvider, icon_url, openweather::OpenWeatherProvider};
