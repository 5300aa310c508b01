use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};

use crate::{
    error::WeatherError,
    model::{Condition, Coordinates, ForecastEntry, ForecastReport, WeatherReading},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Point the provider at another host, e.g. a mock server in tests.
    pub fn with_base_url(api_key: String, base_url: &str) -> anyhow::Result<Self> {
        Url::parse(base_url)
            .with_context(|| format!("Invalid weather provider base URL: {base_url}"))?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(%url, ?query, "OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(WeatherError::Transport)?;

        let status = res.status();
        let body = res.text().await.map_err(WeatherError::Transport)?;

        if !status.is_success() {
            tracing::debug!(%status, "OpenWeather {endpoint} request failed");
            return Err(WeatherError::NotFound {
                status,
                body: truncate_body(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn city_query(city: &str) -> Result<String, WeatherError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(WeatherError::EmptyQuery);
    }
    Ok(city.to_string())
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    #[serde(deserialize_with = "non_empty_conditions")]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    coord: Option<OwCoord>,
    #[serde(default)]
    sys: OwSys,
}

fn non_empty_conditions<'de, D>(deserializer: D) -> Result<Vec<OwWeather>, D::Error>
where
    D: Deserializer<'de>,
{
    let weather = Vec::<OwWeather>::deserialize(deserializer)?;
    if weather.is_empty() {
        return Err(de::Error::custom("current weather has no conditions"));
    }
    Ok(weather)
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

impl From<OwCurrentResponse> for WeatherReading {
    fn from(parsed: OwCurrentResponse) -> Self {
        WeatherReading {
            location_name: parsed.name,
            country: parsed.sys.country,
            timestamp: parsed.dt,
            temperature_c: parsed.main.temp,
            feels_like_c: parsed.main.feels_like,
            humidity_pct: parsed.main.humidity,
            wind_speed_mps: parsed.wind.map(|w| w.speed),
            coordinates: parsed.coord.map(|c| Coordinates {
                latitude: c.lat,
                longitude: c.lon,
            }),
            conditions: parsed
                .weather
                .into_iter()
                .map(|w| Condition {
                    description: w.description,
                    icon: w.icon,
                })
                .collect(),
        }
    }
}

impl From<OwForecastResponse> for ForecastReport {
    fn from(parsed: OwForecastResponse) -> Self {
        let entries = parsed
            .list
            .into_iter()
            .map(|e| {
                let (description, icon) = e
                    .weather
                    .into_iter()
                    .next()
                    .map(|w| (w.description, w.icon))
                    .unwrap_or_default();

                ForecastEntry {
                    timestamp: e.dt,
                    temp_min_c: e.main.temp_min,
                    temp_max_c: e.main.temp_max,
                    description,
                    icon,
                }
            })
            .collect();

        ForecastReport {
            city_name: parsed.city.name,
            country: parsed.city.country,
            entries,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_by_city(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        let q = city_query(city)?;
        let parsed: OwCurrentResponse = self.get("weather", &[("q", q)]).await?;
        Ok(parsed.into())
    }

    async fn current_by_coords(&self, coords: Coordinates) -> Result<WeatherReading, WeatherError> {
        let parsed: OwCurrentResponse = self
            .get(
                "weather",
                &[
                    ("lat", coords.latitude.to_string()),
                    ("lon", coords.longitude.to_string()),
                ],
            )
            .await?;
        Ok(parsed.into())
    }

    async fn forecast_by_city(&self, city: &str) -> Result<ForecastReport, WeatherError> {
        let q = city_query(city)?;
        let parsed: OwForecastResponse = self.get("forecast", &[("q", q)]).await?;
        Ok(parsed.into())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
