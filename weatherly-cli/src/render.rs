//! Human-friendly output for readings, forecasts and the favorites list.

use chrono::{DateTime, Local};
use std::fmt::Write;

use weatherly_core::{DailySummary, Dashboard, FavoriteCity, WeatherReading, icon_url};

/// Whole degrees, halves rounded up.
pub fn degrees(celsius: f64) -> i64 {
    (celsius + 0.5).floor() as i64
}

fn place(name: &str, country: &str) -> String {
    if country.is_empty() {
        name.to_string()
    } else {
        format!("{name}, {country}")
    }
}

pub fn weather_card(reading: &WeatherReading) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", place(&reading.location_name, &reading.country));

    if let Some(condition) = reading.primary_condition() {
        let _ = writeln!(out, "  {}", condition.description);
    }

    let _ = writeln!(
        out,
        "  {}°C  (feels like {}°C)",
        degrees(reading.temperature_c),
        degrees(reading.feels_like_c)
    );
    let _ = writeln!(out, "  {}% humidity", reading.humidity_pct);

    if let Some(speed) = reading.wind_speed_mps {
        let _ = writeln!(out, "  wind {speed:.1} m/s");
    }
    if let Some(observed) = reading.observed_at() {
        let local: DateTime<Local> = observed.with_timezone(&Local);
        let _ = writeln!(out, "  observed {}", local.format("%a %H:%M"));
    }
    if let Some(condition) = reading.primary_condition() {
        let _ = writeln!(out, "  {}", icon_url(&condition.icon));
    }

    out
}

pub fn forecast(city: &str, country: &str, days: &[DailySummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", place(city, country));

    if days.is_empty() {
        let _ = writeln!(out, "  No forecast days available.");
        return out;
    }

    for day in days {
        let _ = writeln!(
            out,
            "  {:<4}{:<24}{:>5}° {:>5}°  {}",
            day.weekday,
            day.description,
            degrees(day.temp_max_c),
            degrees(day.temp_min_c),
            icon_url(&day.icon),
        );
    }

    out
}

pub fn dashboard(dashboard: &Dashboard) -> String {
    if dashboard.cards.is_empty() && dashboard.favorites.is_empty() {
        return "No favorites yet.\n\
                Search for cities and add them with `weatherly search <city> --save`.\n"
            .to_string();
    }

    let mut out = String::new();
    for card in &dashboard.cards {
        out.push_str(&weather_card(&card.reading));
        out.push('\n');
    }

    let missing: Vec<&FavoriteCity> = dashboard.missing().collect();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.city_name.as_str()).collect();
        let _ = writeln!(out, "Weather unavailable for: {}", names.join(", "));
    }

    out
}

pub fn about() -> String {
    let features = [
        ("Real-time Weather", "Current conditions powered by the OpenWeatherMap API"),
        ("5-Day Forecast", "Daily highs and lows for the days ahead"),
        ("Global Coverage", "Weather information for cities worldwide"),
        ("Favorite Cities", "Save and track weather for your favorite locations"),
    ];

    let mut out = format!(
        "weatherly {}\nYour personal weather companion\n\n",
        env!("CARGO_PKG_VERSION")
    );
    for (title, description) in features {
        let _ = writeln!(out, "  {title:<18}{description}");
    }
    out
}
