//! The favorites "home" view: a user's saved cities with current weather.

use std::sync::Arc;
use tokio::task::JoinSet;

use crate::{
    error::StoreError,
    favorites::FavoritesStore,
    model::{FavoriteCity, WeatherReading},
    provider::WeatherProvider,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteWeather {
    pub favorite: FavoriteCity,
    pub reading: WeatherReading,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    /// Every saved city, newest first.
    pub favorites: Vec<FavoriteCity>,
    /// Cities whose weather could be fetched, in the same order.
    pub cards: Vec<FavoriteWeather>,
}

impl Dashboard {
    /// Favorites that were dropped because their weather fetch failed.
    pub fn missing(&self) -> impl Iterator<Item = &FavoriteCity> {
        self.favorites
            .iter()
            .filter(|f| !self.cards.iter().any(|c| c.favorite.id == f.id))
    }
}

/// Load the user's favorites, then fetch current weather for all of them
/// concurrently. A failed fetch drops that city instead of failing the
/// refresh; only a failure to list favorites is an error.
pub async fn refresh<S>(
    store: &S,
    provider: Arc<dyn WeatherProvider>,
    user_id: &str,
) -> Result<Dashboard, StoreError>
where
    S: FavoritesStore + ?Sized,
{
    let favorites = store.list(user_id).await?;

    let mut tasks = JoinSet::new();
    for (idx, favorite) in favorites.iter().enumerate() {
        let provider = Arc::clone(&provider);
        let city = favorite.city_name.clone();
        tasks.spawn(async move {
            let result = provider.current_by_city(&city).await;
            (idx, city, result)
        });
    }

    let mut slots: Vec<Option<WeatherReading>> = vec![None; favorites.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, _, Ok(reading))) => slots[idx] = Some(reading),
            Ok((_, city, Err(e))) => {
                tracing::warn!(%city, error = %e, "Dropping favorite from refresh");
            }
            Err(e) => tracing::warn!(error = %e, "Weather fetch task failed"),
        }
    }

    let cards = favorites
        .iter()
        .zip(slots)
        .filter_map(|(favorite, reading)| {
            reading.map(|reading| FavoriteWeather {
                favorite: favorite.clone(),
                reading,
            })
        })
        .collect();

    Ok(Dashboard { favorites, cards })
}
