//! Client for the hosted `favorites` table.
//!
//! The table is reached through the backend's PostgREST surface at
//! `{url}/rest/v1/favorites` and every call is scoped to one user id.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

use crate::{auth::Session, config::BackendEndpoint, error::StoreError, model::FavoriteCity};

#[async_trait]
pub trait FavoritesStore: Send + Sync + Debug {
    /// All favorites of `user_id`, newest first.
    async fn list(&self, user_id: &str) -> Result<Vec<FavoriteCity>, StoreError>;

    async fn exists(&self, user_id: &str, city_name: &str) -> Result<bool, StoreError>;

    async fn insert(&self, user_id: &str, city_name: &str) -> Result<FavoriteCity, StoreError>;

    /// Remove `city_name` from the user's favorites. `Ok(false)` when no
    /// saved row matched.
    async fn delete(&self, user_id: &str, city_name: &str) -> Result<bool, StoreError>;
}

/// Result of [`add_favorite`].
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(FavoriteCity),
    AlreadyPresent,
}

/// Add `city_name` unless the user already has it.
///
/// The existence check and the insert are two separate round trips, so two
/// concurrent calls for the same city can both insert.
pub async fn add_favorite<S>(
    store: &S,
    user_id: &str,
    city_name: &str,
) -> Result<AddOutcome, StoreError>
where
    S: FavoritesStore + ?Sized,
{
    if store.exists(user_id, city_name).await? {
        tracing::info!(city_name, "Already a favorite");
        return Ok(AddOutcome::AlreadyPresent);
    }

    let row = store.insert(user_id, city_name).await?;
    tracing::info!(city_name, "Added favorite");
    Ok(AddOutcome::Added(row))
}

#[derive(Debug, Serialize)]
struct NewFavorite<'a> {
    user_id: &'a str,
    city_name: &'a str,
}

#[derive(Debug, Clone)]
pub struct RestFavoritesStore {
    endpoint: BackendEndpoint,
    access_token: String,
    http: Client,
}

impl RestFavoritesStore {
    pub fn new(endpoint: BackendEndpoint, session: &Session) -> Self {
        Self {
            endpoint,
            access_token: session.access_token.clone(),
            http: Client::new(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/favorites", self.endpoint.url)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.endpoint.anon_key)
            .bearer_auth(&self.access_token)
    }

    async fn send(&self, req: RequestBuilder) -> Result<String, StoreError> {
        let res = self
            .authorized(req)
            .send()
            .await
            .map_err(StoreError::Transport)?;
        read_success(res).await
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, StoreError> {
        let body = self.send(req).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

async fn read_success(res: Response) -> Result<String, StoreError> {
    let status = res.status();
    let body = res.text().await.map_err(StoreError::Transport)?;

    if !status.is_success() {
        tracing::debug!(%status, %body, "Favorites request failed");
        return Err(StoreError::Backend { status, body });
    }

    Ok(body)
}

#[async_trait]
impl FavoritesStore for RestFavoritesStore {
    async fn list(&self, user_id: &str) -> Result<Vec<FavoriteCity>, StoreError> {
        let req = self.http.get(self.table_url()).query(&[
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("order", "created_at.desc".to_string()),
        ]);

        let rows: Vec<FavoriteCity> = self.send_json(req).await?;
        tracing::debug!(count = rows.len(), "Loaded favorites");
        Ok(rows)
    }

    async fn exists(&self, user_id: &str, city_name: &str) -> Result<bool, StoreError> {
        let req = self.http.get(self.table_url()).query(&[
            ("select", "id".to_string()),
            ("user_id", eq(user_id)),
            ("city_name", eq(city_name)),
        ]);

        let rows: Vec<serde_json::Value> = self.send_json(req).await?;
        Ok(!rows.is_empty())
    }

    async fn insert(&self, user_id: &str, city_name: &str) -> Result<FavoriteCity, StoreError> {
        let req = self
            .http
            .post(self.table_url())
            .header("Prefer", "return=representation")
            .json(&[NewFavorite { user_id, city_name }]);

        let mut rows: Vec<FavoriteCity> = self.send_json(req).await?;
        rows.pop().ok_or_else(|| StoreError::Backend {
            status: reqwest::StatusCode::OK,
            body: "insert returned no rows".to_string(),
        })
    }

    async fn delete(&self, user_id: &str, city_name: &str) -> Result<bool, StoreError> {
        let req = self
            .http
            .delete(self.table_url())
            .header("Prefer", "return=representation")
            .query(&[("user_id", eq(user_id)), ("city_name", eq(city_name))]);

        let body = self.send(req).await?;
        let removed = if body.trim().is_empty() {
            0
        } else {
            serde_json::from_str::<Vec<serde_json::Value>>(&body)?.len()
        };

        if removed == 0 {
            tracing::info!(city_name, "No favorite to remove");
            return Ok(false);
        }
        tracing::info!(city_name, removed, "Removed favorite");
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    /// In-memory store used by unit tests across the crate.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryStore {
        pub rows: Mutex<Vec<FavoriteCity>>,
        pub fail: bool,
    }

    impl MemoryStore {
        pub fn with_cities(user_id: &str, cities: &[&str]) -> Self {
            let rows = cities
                .iter()
                .enumerate()
                .map(|(i, c)| FavoriteCity {
                    id: i.to_string(),
                    user_id: user_id.to_string(),
                    city_name: c.to_string(),
                    created_at: Utc.timestamp_opt(1_700_000_000 - i as i64, 0).unwrap(),
                })
                .collect();
            Self {
                rows: Mutex::new(rows),
                fail: false,
            }
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Backend {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl FavoritesStore for MemoryStore {
        async fn list(&self, user_id: &str) -> Result<Vec<FavoriteCity>, StoreError> {
            self.check()?;
            let mut rows: Vec<_> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        }

        async fn exists(&self, user_id: &str, city_name: &str) -> Result<bool, StoreError> {
            self.check()?;
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .any(|r| r.user_id == user_id && r.city_name == city_name))
        }

        async fn insert(&self, user_id: &str, city_name: &str) -> Result<FavoriteCity, StoreError> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let row = FavoriteCity {
                id: rows.len().to_string(),
                user_id: user_id.to_string(),
                city_name: city_name.to_string(),
                created_at: Utc::now(),
            };
            rows.push(row.clone());
            Ok(row)
        }

        async fn delete(&self, user_id: &str, city_name: &str) -> Result<bool, StoreError> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| !(r.user_id == user_id && r.city_name == city_name));
            Ok(rows.len() < before)
        }
    }

    #[tokio::test]
    async fn add_favorite_inserts_new_city() {
        let store = MemoryStore::default();

        let outcome = add_favorite(&store, "u1", "Oslo").await.unwrap();

        assert!(matches!(outcome, AddOutcome::Added(ref row) if row.city_name == "Oslo"));
        assert_eq!(store.list("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_favorite_skips_existing_city() {
        let store = MemoryStore::with_cities("u1", &["Oslo"]);

        let outcome = add_favorite(&store, "u1", "Oslo").await.unwrap();

        assert_eq!(outcome, AddOutcome::AlreadyPresent);
        assert_eq!(store.list("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_favorite_is_scoped_by_user() {
        let store = MemoryStore::with_cities("u1", &["Oslo"]);

        let outcome = add_favorite(&store, "u2", "Oslo").await.unwrap();

        assert!(matches!(outcome, AddOutcome::Added(_)));
    }

    #[tokio::test]
    async fn add_favorite_propagates_store_errors() {
        let store = MemoryStore {
            fail: true,
            ..Default::default()
        };

        let err = add_favorite(&store, "u1", "Oslo").await.unwrap_err();

        assert!(matches!(err, StoreError::Backend { .. }));
        assert_eq!(err.user_message(), "Favorites request failed. Please try again.");
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_matched() {
        let store = MemoryStore::with_cities("u1", &["London"]);

        assert!(!store.delete("u1", "london").await.unwrap());
        assert!(!store.delete("u2", "London").await.unwrap());
        assert!(store.delete("u1", "London").await.unwrap());
        assert!(store.list("u1").await.unwrap().is_empty());
    }

    #[test]
    fn eq_filter_format() {
        assert_eq!(eq("São Paulo"), "eq.São Paulo");
    }
}
