use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, Text};
use std::{fmt, path::PathBuf, sync::Arc};

use weatherly_core::{
    AddOutcome, AuthClient, AuthError, Config, Coordinates, FavoritesStore, IpLocationProvider,
    LocationError, LocationProvider, RestFavoritesStore, Session, SignUpOutcome, StoreError,
    WeatherError, WeatherProvider, WeatherReading, daily_summaries_local, dashboard,
    favorites::add_favorite, provider::provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherly", version, about = "Weather and forecasts for your favorite cities")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Current weather for a city.
    Search {
        city: String,

        /// Add the city to your favorites.
        #[arg(long)]
        save: bool,
    },

    /// Current weather at your position.
    Here {
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Add the resolved city to your favorites.
        #[arg(long)]
        save: bool,
    },

    /// 5-day forecast for a city.
    Forecast { city: String },

    /// Your favorite cities with current weather.
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesCommand>,
    },

    /// Sign in to your account.
    Login {
        #[arg(long)]
        email: Option<String>,
    },

    /// Create an account.
    Signup {
        #[arg(long)]
        email: Option<String>,
    },

    /// Sign out and forget the saved session.
    Logout {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the signed-in account.
    Whoami,

    /// About weatherly.
    About,

    /// Configure the weather API key, backend and location access.
    Configure,
}

#[derive(Debug, Subcommand)]
pub enum FavoritesCommand {
    /// List favorites with current weather (default).
    List,

    /// Add a city to your favorites.
    Add { city: String },

    /// Remove a city from your favorites.
    Remove {
        city: String,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// A user-facing alert: a short title plus a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: &'static str,
    pub message: String,
}

impl Alert {
    fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error",
            message: message.into(),
        }
    }

    /// Pick the alert to show for a failed command.
    pub fn from_error(err: &anyhow::Error) -> Self {
        if let Some(alert) = err.downcast_ref::<Alert>() {
            return alert.clone();
        }
        if let Some(e) = err.downcast_ref::<LocationError>() {
            return match e {
                LocationError::PermissionDenied => Alert {
                    title: "Permission Denied",
                    message: e.user_message(),
                },
                _ => Alert::error(e.user_message()),
            };
        }
        if let Some(e) = err.downcast_ref::<WeatherError>() {
            return Alert::error(e.user_message());
        }
        if let Some(e) = err.downcast_ref::<StoreError>() {
            return Alert::error(e.user_message());
        }
        if let Some(e) = err.downcast_ref::<AuthError>() {
            return Alert::error(e.user_message());
        }
        Alert::error(format!("{err:#}"))
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Loaded config plus where the session lives.
struct App {
    config: Config,
    session_path: PathBuf,
}

impl App {
    fn load() -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
            session_path: Config::session_file_path()?,
        })
    }

    fn provider(&self) -> Result<Arc<dyn WeatherProvider>> {
        Ok(Arc::new(provider_from_config(&self.config)?))
    }

    fn session(&self) -> Result<Session> {
        Session::load_from(&self.session_path)?.ok_or_else(|| StoreError::NoSession.into())
    }

    fn store(&self) -> Result<(RestFavoritesStore, Session)> {
        let endpoint = self.config.backend_endpoint().ok_or(StoreError::NotConfigured)?;
        let session = self.session()?;
        Ok((RestFavoritesStore::new(endpoint, &session), session))
    }

    fn auth(&self) -> Result<AuthClient> {
        let endpoint = self.config.backend_endpoint().ok_or(AuthError::NotConfigured)?;
        Ok(AuthClient::new(endpoint))
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::About => {
                print!("{}", render::about());
                Ok(())
            }
            command => {
                let app = App::load()?;
                app.run(command).await
            }
        }
    }
}

impl App {
    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Search { city, save } => {
                let reading = self.provider()?.current_by_city(&city).await?;
                print!("{}", render::weather_card(&reading));
                if save {
                    save_favorite(self, &reading).await?;
                }
            }
            Command::Here { lat, lon, save } => {
                let coords = match (lat, lon) {
                    (Some(latitude), Some(longitude)) => Coordinates { latitude, longitude },
                    _ => IpLocationProvider::from_config(&self.config).current_location().await?,
                };
                let reading = self
                    .provider()?
                    .current_by_coords(coords)
                    .await
                    .context(Alert::error("Failed to get current location weather."))?;
                print!("{}", render::weather_card(&reading));
                if save {
                    save_favorite(self, &reading).await?;
                }
            }
            Command::Forecast { city } => {
                let report = self.provider()?.forecast_by_city(&city).await?;
                let days = daily_summaries_local(&report.entries);
                tracing::debug!(
                    entries = report.entries.len(),
                    days = days.len(),
                    "Aggregated forecast"
                );
                print!("{}", render::forecast(&report.city_name, &report.country, &days));
            }
            Command::Favorites { action } => match action.unwrap_or(FavoritesCommand::List) {
                FavoritesCommand::List => {
                    let (store, session) = self.store()?;
                    let dash = dashboard::refresh(&store, self.provider()?, &session.user_id)
                        .await
                        .context(Alert::error("Failed to load favorites."))?;
                    print!("{}", render::dashboard(&dash));
                }
                FavoritesCommand::Add { city } => {
                    let reading = self.provider()?.current_by_city(&city).await?;
                    save_favorite(self, &reading).await?;
                }
                FavoritesCommand::Remove { city, yes } => {
                    let (store, session) = self.store()?;
                    if !yes && !confirm(&format!("Remove {city} from favorites?"))? {
                        return Ok(());
                    }
                    let removed = store
                        .delete(&session.user_id, &city)
                        .await
                        .context(Alert::error("Failed to remove favorite"))?;
                    println!("{}", removal_message(&city, removed));
                }
            },
            Command::Login { email } => {
                let email = prompt_email(email)?;
                let password = Password::new("Password:").without_confirmation().prompt()?;
                let session = self.auth()?.sign_in(&email, &password).await?;
                session.save_to(&self.session_path)?;
                println!("Signed in as {}.", session.email.as_deref().unwrap_or(&email));
            }
            Command::Signup { email } => {
                let email = prompt_email(email)?;
                let password = Password::new("Password:").prompt()?;
                match self.auth()?.sign_up(&email, &password).await? {
                    SignUpOutcome::SignedIn(session) => {
                        session.save_to(&self.session_path)?;
                        println!("Account created. Signed in as {email}.");
                    }
                    SignUpOutcome::ConfirmationPending => {
                        println!("Account created. Check your inbox to confirm it, then sign in.");
                    }
                }
            }
            Command::Logout { yes } => {
                let Some(session) = Session::load_from(&self.session_path)? else {
                    println!("Not signed in.");
                    return Ok(());
                };
                if !yes && !confirm("Are you sure you want to sign out?")? {
                    return Ok(());
                }
                // The local session is dropped even if the server call fails.
                if let Err(e) = self.auth()?.sign_out(&session).await {
                    tracing::warn!(error = %e, "Server-side sign out failed");
                }
                Session::clear(&self.session_path)?;
                println!("Signed out.");
            }
            Command::Whoami => match Session::load_from(&self.session_path)? {
                Some(session) => println!(
                    "{} ({})",
                    session.email.as_deref().unwrap_or("unknown email"),
                    session.user_id
                ),
                None => println!("Not signed in."),
            },
            // Handled before the config is loaded.
            Command::About | Command::Configure => {}
        }

        Ok(())
    }
}

async fn save_favorite(app: &App, reading: &WeatherReading) -> Result<()> {
    let (store, session) = app.store()?;
    let outcome = add_favorite(&store, &session.user_id, &reading.location_name)
        .await
        .context(Alert::error("Failed to add to favorites."))?;

    match outcome {
        AddOutcome::Added(fav) => println!("{} added to favorites!", fav.city_name),
        AddOutcome::AlreadyPresent => println!("This city is already in your favorites."),
    }
    Ok(())
}

fn removal_message(city: &str, removed: bool) -> String {
    if removed {
        format!("Removed {city} from favorites.")
    } else {
        format!("{city} is not in your favorites. Names must match `weatherly favorites` exactly.")
    }
}

fn prompt_email(email: Option<String>) -> Result<String> {
    match email {
        Some(email) => Ok(email),
        None => Ok(Text::new("Email:").prompt()?),
    }
}

fn confirm(question: &str) -> Result<bool> {
    Ok(Confirm::new(question).with_default(false).prompt()?)
}

fn configure() -> Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load()?;

    let api_key = Text::new("OpenWeatherMap API key:")
        .with_default(config.weather.api_key.as_deref().unwrap_or(""))
        .with_help_message("OPENWEATHER_API_KEY takes precedence when set")
        .prompt()?;
    config.weather.api_key = Some(api_key.trim().to_string()).filter(|k| !k.is_empty());

    let url = Text::new("Backend URL:")
        .with_default(config.backend.url.as_deref().unwrap_or(""))
        .prompt()?;
    config.backend.url = Some(url.trim().to_string()).filter(|u| !u.is_empty());

    let anon_key = Text::new("Backend anon key:")
        .with_default(config.backend.anon_key.as_deref().unwrap_or(""))
        .prompt()?;
    config.backend.anon_key = Some(anon_key.trim().to_string()).filter(|k| !k.is_empty());

    config.location.allow = Confirm::new("Allow looking up your location from your IP address?")
        .with_default(config.location.allow)
        .prompt()?;

    config.save()?;
    tracing::info!(path = %path.display(), "Configuration saved");
    println!("Configuration saved to {}", path.display());
    Ok(())
}
