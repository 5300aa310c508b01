//! Error taxonomy shared by the weather, favorites, auth and location clients.

pub use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the weather provider.
///
/// The provider does not let us tell "no such city" apart from "provider
/// unavailable", so every non-success status collapses into `NotFound`.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("empty location query")]
    EmptyQuery,

    #[error("weather provider returned {status}: {body}")]
    NotFound { status: StatusCode, body: String },

    #[error("failed to reach weather provider: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to parse weather provider response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl WeatherError {
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyQuery => "Please enter a city name.".to_string(),
            _ => "City not found. Please try again.".to_string(),
        }
    }
}

/// Failures from the hosted favorites table.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not signed in")]
    NoSession,

    #[error("backend is not configured (set [backend] url and anon_key)")]
    NotConfigured,

    #[error("backend returned {status}: {body}")]
    Backend { status: StatusCode, body: String },

    #[error("failed to reach backend: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to parse backend response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl StoreError {
    pub fn user_message(&self) -> String {
        match self {
            Self::NoSession => "Please sign in first (`weatherly login`).".to_string(),
            Self::NotConfigured => {
                "Favorites backend is not configured. Run `weatherly configure`.".to_string()
            }
            _ => "Favorites request failed. Please try again.".to_string(),
        }
    }
}

/// Failures from the backend's auth endpoints.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email and password are required")]
    MissingCredentials,

    #[error("backend is not configured (set [backend] url and anon_key)")]
    NotConfigured,

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("failed to reach auth service: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to parse auth response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredentials => "Please fill in all fields".to_string(),
            Self::Rejected { message, .. } => message.clone(),
            Self::NotConfigured => {
                "Auth backend is not configured. Run `weatherly configure`.".to_string()
            }
            Self::Transport(_) | Self::Parse(_) => {
                "Authentication failed. Please try again.".to_string()
            }
        }
    }
}

/// Failures resolving the device position.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location service unavailable: {0}")]
    Unavailable(String),

    #[error("failed to reach location service: {0}")]
    Transport(#[from] reqwest::Error),
}

impl LocationError {
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => {
                "Please allow location access to use this feature \
                 (set `allow = true` under [location] or pass --lat/--lon)."
                    .to_string()
            }
            _ => "Failed to get current location weather.".to_string(),
        }
    }
}
