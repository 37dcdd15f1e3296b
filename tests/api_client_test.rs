// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! ApiClient against an in-process axum stub of the backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};

use optrack::api::ApiClient;
use optrack::config::AppConfig;
use optrack::error::ApiError;
use optrack::session::{CredentialStore, Credentials, MemoryCredentialStore};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client_for(url: &str, store: Arc<dyn CredentialStore>) -> ApiClient {
    let config = AppConfig { api_url: url.to_string(), ..AppConfig::default() };
    ApiClient::new(&config, store).unwrap().with_retry_delay(Duration::ZERO)
}

fn logged_in() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_credentials(Credentials::new(
        "secret-token",
        Some("ana".to_string()),
    )))
}

#[tokio::test]
async fn test_server_error_is_retried_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/api/teams",
        get(move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response()
                } else {
                    Json(json!([{ "id": 1, "name": "Costura", "numPersons": 12, "loadDays": "2.5" }]))
                        .into_response()
                }
            }
        }),
    );
    let client = client_for(&serve(router).await, logged_in());

    let teams = client.list_teams().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].name, "Costura");
    assert_eq!(teams[0].load_days, Some(2.5));
}

#[tokio::test]
async fn test_persistent_server_error_gives_up_after_two_attempts() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/api/products",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "database down" })))
            }
        }),
    );
    let client = client_for(&serve(router).await, logged_in());

    let err = client.list_products().await.unwrap_err();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message.as_deref(), Some("database down"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/api/teams",
        post(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::BAD_REQUEST, Json(json!({ "errores": ["nombre requerido", "personas > 0"] })))
            }
        }),
    );
    let client = client_for(&serve(router).await, logged_in());

    let payload = optrack::types::TeamPayload {
        id: None,
        name: String::new(),
        description: String::new(),
        num_persons: 0,
    };
    let err = client.create_team(&payload).await.unwrap_err();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.user_message("fallback"), "nombre requerido, personas > 0");
}

#[tokio::test]
async fn test_unauthorized_maps_to_variant() {
    let router = Router::new().route("/api/users", get(|| async { StatusCode::UNAUTHORIZED }));
    let client = client_for(&serve(router).await, logged_in());

    let err = client.list_users().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_bearer_token_is_sent_when_logged_in() {
    let router = Router::new().route(
        "/api/users/by-name/:name",
        get(|Path(name): Path<String>, headers: HeaderMap| async move {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(json!({ "id": 7, "name": name, "email": auth, "role": "FULL_ACCESS" }))
        }),
    );
    let client = client_for(&serve(router).await, logged_in());

    let user = client.current_user().await.unwrap();
    assert_eq!(user.id, 7);
    assert_eq!(user.name, "ana");
    assert_eq!(user.email, "Bearer secret-token");
}

#[tokio::test]
async fn test_no_authorization_header_without_credentials() {
    let router = Router::new().route(
        "/api/products",
        get(|headers: HeaderMap| async move {
            if headers.contains_key("authorization") {
                StatusCode::BAD_REQUEST.into_response()
            } else {
                Json(json!([])).into_response()
            }
        }),
    );
    let client = client_for(&serve(router).await, Arc::new(MemoryCredentialStore::new()));

    assert!(client.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_path_segments_are_encoded() {
    let router = Router::new().route(
        "/api/products/by-op/:op",
        get(|Path(op): Path<String>| async move { Json(json!([{ "id": 1, "op": op }])) }),
    );
    let client = client_for(&serve(router).await, logged_in());

    let found = client.products_by_op("45/12 A").await.unwrap();
    assert_eq!(found[0].op.as_deref(), Some("45/12 A"));
}

#[tokio::test]
async fn test_date_range_query_and_ordering() {
    let router = Router::new().route(
        "/api/products/date-range",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(params.get("start").map(String::as_str), Some("2025-01-01"));
            assert_eq!(params.get("end").map(String::as_str), Some("2025-01-31"));
            assert_eq!(params.get("teamId").map(String::as_str), Some("3"));
            Json(json!([
                { "id": 1, "assignedDate": "2025-01-05" },
                { "id": 2 },
                { "id": 3, "assignedDate": "2025-01-20" }
            ]))
        }),
    );
    let client = client_for(&serve(router).await, logged_in());

    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
    let rows = client.date_range_report(start, end, Some(3)).await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
}

#[tokio::test]
async fn test_empty_delete_response() {
    let router = Router::new().route("/api/products/:id", delete(|| async { StatusCode::NO_CONTENT }));
    let client = client_for(&serve(router).await, logged_in());

    client.delete_product(9).await.unwrap();
}

#[tokio::test]
async fn test_login_stores_credentials() {
    let router = Router::new().route(
        "/api/auth/login",
        post(|Json(body): Json<Value>| async move {
            if body["userName"] == "ana" && body["password"] == "clave123" {
                Json(json!({ "token": "fresh-token" })).into_response()
            } else {
                (StatusCode::UNAUTHORIZED, "bad credentials").into_response()
            }
        }),
    );
    let store = Arc::new(MemoryCredentialStore::new());
    let client = client_for(&serve(router).await, store.clone());

    let err = client.login("ana", "wrong").await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(!store.is_authenticated());

    let credentials = client.login("ana", "clave123").await.unwrap();
    assert_eq!(credentials.token, "fresh-token");
    assert!(store.is_authenticated());
    assert_eq!(store.user_name().as_deref(), Some("ana"));

    client.logout();
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{}", addr), logged_in());
    let err = client.list_teams().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {:?}", err);
    assert!(err.is_retryable());
}
