use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    Config,
    error::WeatherError,
    model::{Coordinates, ForecastReport, WeatherReading},
    provider::openweather::OpenWeatherProvider,
};

pub mod openweather;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn/";
const ICON_SUFFIX: &str = "@2x.png";

/// Display URL for a provider icon code such as "10d".
pub fn icon_url(icon_code: &str) -> String {
    format!("{ICON_BASE_URL}{icon_code}{ICON_SUFFIX}")
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a city name.
    async fn current_by_city(&self, city: &str) -> Result<WeatherReading, WeatherError>;

    /// Current conditions at a position.
    async fn current_by_coords(&self, coords: Coordinates) -> Result<WeatherReading, WeatherError>;

    /// 5-day forecast at 3-hour resolution for a city name.
    async fn forecast_by_city(&self, city: &str) -> Result<ForecastReport, WeatherError>;
}

/// Construct the weather provider described by `config`.
///
/// A missing API key is not rejected here; the provider answers such
/// requests with 401, which surfaces as [`WeatherError::NotFound`].
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = config.weather_api_key().unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("No weather API key configured; requests will be rejected by the provider");
    }

    let provider = match config.weather.base_url.as_deref() {
        Some(base) => OpenWeatherProvider::with_base_url(api_key, base)?,
        None => OpenWeatherProvider::new(api_key),
    };

    Ok(provider)
}
