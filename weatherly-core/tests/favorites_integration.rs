//! Integration tests for RestFavoritesStore and AuthClient using wiremock.

use weatherly_core::{
    AddOutcome, AuthClient, BackendEndpoint, FavoritesStore, RestFavoritesStore, Session,
    SignUpOutcome, StoreError, favorites::add_favorite,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoint(server: &MockServer) -> BackendEndpoint {
    BackendEndpoint {
        url: server.uri(),
        anon_key: "ANON".into(),
    }
}

fn session() -> Session {
    Session {
        access_token: "TOKEN".into(),
        user_id: "user-1".into(),
        email: Some("me@example.com".into()),
    }
}

fn row(id: &str, city: &str, created_at: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "user_id": "user-1",
        "city_name": city,
        "created_at": created_at
    })
}

#[tokio::test]
async fn test_list_favorites_newest_first() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/favorites"))
        .and(query_param("user_id", "eq.user-1"))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", "ANON"))
        .and(header("authorization", "Bearer TOKEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            row("b", "Rome", "2024-05-02T10:00:00+00:00"),
            row("a", "Oslo", "2024-05-01T10:00:00+00:00"),
        ])))
        .mount(&mock_server)
        .await;

    let store = RestFavoritesStore::new(endpoint(&mock_server), &session());
    let rows = store.list("user-1").await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].city_name, "Rome");
    assert_eq!(rows[1].id, "a");
}

#[tokio::test]
async fn test_add_favorite_inserts_when_absent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/favorites"))
        .and(query_param("select", "id"))
        .and(query_param("city_name", "eq.Oslo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/favorites"))
        .and(header("prefer", "return=representation"))
        .and(body_json(serde_json::json!([{"user_id": "user-1", "city_name": "Oslo"}])))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!([row("c", "Oslo", "2024-05-03T10:00:00Z")])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = RestFavoritesStore::new(endpoint(&mock_server), &session());
    let outcome = add_favorite(&store, "user-1", "Oslo").await.unwrap();

    match outcome {
        AddOutcome::Added(fav) => assert_eq!(fav.city_name, "Oslo"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_add_favorite_skips_duplicate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/favorites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": 7}])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let store = RestFavoritesStore::new(endpoint(&mock_server), &session());
    let outcome = add_favorite(&store, "user-1", "Oslo").await.unwrap();

    assert_eq!(outcome, AddOutcome::AlreadyPresent);
}

#[tokio::test]
async fn test_delete_favorite_filters_by_user_and_city() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/favorites"))
        .and(query_param("user_id", "eq.user-1"))
        .and(query_param("city_name", "eq.New York"))
        .and(header("prefer", "return=representation"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([row("d", "New York", "2024-05-04T10:00:00Z")])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = RestFavoritesStore::new(endpoint(&mock_server), &session());
    assert!(store.delete("user-1", "New York").await.unwrap());
}

#[tokio::test]
async fn test_delete_unsaved_city_removes_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/favorites"))
        .and(query_param("city_name", "eq.london"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = RestFavoritesStore::new(endpoint(&mock_server), &session());
    assert!(!store.delete("user-1", "london").await.unwrap());
}

#[tokio::test]
async fn test_delete_with_empty_204_removes_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/favorites"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let store = RestFavoritesStore::new(endpoint(&mock_server), &session());
    assert!(!store.delete("user-1", "london").await.unwrap());
}

#[tokio::test]
async fn test_backend_error_is_store_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/favorites"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "JWT expired"
        })))
        .mount(&mock_server)
        .await;

    let store = RestFavoritesStore::new(endpoint(&mock_server), &session());
    let err = store.list("user-1").await.unwrap_err();

    assert!(matches!(err, StoreError::Backend { .. }));
    assert!(err.to_string().contains("JWT expired"));
}

#[tokio::test]
async fn test_sign_in_returns_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "ANON"))
        .and(body_json(serde_json::json!({"email": "me@example.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "TOKEN",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "R",
            "user": {"id": "user-1", "email": "me@example.com"}
        })))
        .mount(&mock_server)
        .await;

    let client = AuthClient::new(endpoint(&mock_server));
    let got = client.sign_in(" me@example.com ", "pw").await.unwrap();

    assert_eq!(got, session());
}

#[tokio::test]
async fn test_sign_in_rejected_surfaces_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&mock_server)
        .await;

    let client = AuthClient::new(endpoint(&mock_server));
    let err = client.sign_in("me@example.com", "wrong").await.unwrap_err();

    assert_eq!(err.user_message(), "Invalid login credentials");
}

#[tokio::test]
async fn test_sign_up_pending_confirmation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "user-2",
            "email": "new@example.com",
            "confirmation_sent_at": "2024-05-01T10:00:00Z"
        })))
        .mount(&mock_server)
        .await;

    let client = AuthClient::new(endpoint(&mock_server));
    let outcome = client.sign_up("new@example.com", "pw").await.unwrap();

    assert_eq!(outcome, SignUpOutcome::ConfirmationPending);
}

#[tokio::test]
async fn test_sign_up_auto_confirmed_signs_in() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "NEW",
            "user": {"id": "user-3", "email": "auto@example.com"}
        })))
        .mount(&mock_server)
        .await;

    let client = AuthClient::new(endpoint(&mock_server));
    let outcome = client.sign_up("auto@example.com", "pw").await.unwrap();

    match outcome {
        SignUpOutcome::SignedIn(session) => {
            assert_eq!(session.access_token, "NEW");
            assert_eq!(session.user_id, "user-3");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_sign_out_sends_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer TOKEN"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AuthClient::new(endpoint(&mock_server));
    client.sign_out(&session()).await.unwrap();
}
