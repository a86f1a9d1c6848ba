use super::test_util;
use crate::{SharedData, build_router, dto, persistence};
use axum::Router;
use axum::body::{self, Body};
use axum::http::{Method, Request, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Barrier;
use tokio::task::JoinSet;
use tower::ServiceExt;

fn router_for(db: PgPool) -> Router {
    build_router(Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db),
    }))
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    json_body: Option<&impl Serialize>,
) -> (StatusCode, Vec<u8>) {
    let request_builder = Request::builder().method(method).uri(uri);
    let request = match json_body {
        Some(content) => request_builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::to_vec(content).expect("Could not serialize request body"),
            )),
        None => request_builder.body(Body::empty()),
    }
    .expect("Could not build request");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed to respond");
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    (status, bytes.to_vec())
}

fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).unwrap_or_else(|err| {
        panic!(
            "Could not parse response: {err}. Body: {}",
            String::from_utf8_lossy(bytes)
        )
    })
}

const NO_BODY: Option<&()> = None;

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn task_lifecycle_through_http() {
    test_util::prepare_db_and_test(|db| async move {
        let router = router_for(db);

        let (status, body) = send(
            &router,
            Method::POST,
            "/tasks",
            Some(&serde_json::json!({ "title": "Buy milk" })),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);
        let created: dto::Task = parse(&body);
        assert!(!created.complete);
        assert_eq!(None, created.user_id);

        let (status, body) = send(
            &router,
            Method::PATCH,
            &format!("/tasks/{}/completion", created.id),
            Some(&dto::TaskCompletion { complete: true }),
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        let completed: dto::Task = parse(&body);
        assert!(completed.complete);
        assert_eq!(created.create, completed.create);

        let (status, _) = send(
            &router,
            Method::DELETE,
            &format!("/tasks/{}", created.id),
            NO_BODY,
        )
        .await;
        assert_eq!(StatusCode::NO_CONTENT, status);

        let (status, body) = send(
            &router,
            Method::GET,
            &format!("/tasks/{}", created.id),
            NO_BODY,
        )
        .await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        let error_body: serde_json::Value = parse(&body);
        assert_eq!("not_found", error_body["error_code"]);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn user_deletion_cascades_over_http() {
    test_util::prepare_db_and_test(|db| async move {
        let router = router_for(db);

        let (status, body) = send(
            &router,
            Method::POST,
            "/users",
            Some(&dto::NewUser {
                first_name: "Jane".to_owned(),
                last_name: "Doe".to_owned(),
            }),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);
        let user: dto::InsertedUser = parse(&body);

        let (status, _) = send(
            &router,
            Method::POST,
            "/users",
            Some(&dto::NewUser {
                first_name: "Jane".to_owned(),
                last_name: "Doe".to_owned(),
            }),
        )
        .await;
        assert_eq!(StatusCode::CONFLICT, status);

        for title in ["Water plants", "Feed cat"] {
            let (status, _) = send(
                &router,
                Method::POST,
                "/tasks",
                Some(&serde_json::json!({ "title": title, "user_id": user.id })),
            )
            .await;
            assert_eq!(StatusCode::CREATED, status);
        }

        let (status, body) = send(
            &router,
            Method::GET,
            &format!("/users/{}/tasks", user.id),
            NO_BODY,
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        let owned: Vec<dto::Task> = parse(&body);
        assert_eq!(2, owned.len());

        let (status, _) = send(
            &router,
            Method::DELETE,
            &format!("/users/{}", user.id),
            NO_BODY,
        )
        .await;
        assert_eq!(StatusCode::NO_CONTENT, status);

        let (status, body) = send(&router, Method::GET, "/tasks", NO_BODY).await;
        assert_eq!(StatusCode::OK, status);
        let remaining: Vec<dto::Task> = parse(&body);
        assert!(remaining.is_empty());

        let (status, _) = send(
            &router,
            Method::GET,
            &format!("/users/{}/tasks", user.id),
            NO_BODY,
        )
        .await;
        assert_eq!(StatusCode::NOT_FOUND, status);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn task_for_unknown_owner_is_rejected() {
    test_util::prepare_db_and_test(|db| async move {
        let router = router_for(db);

        let (status, _) = send(
            &router,
            Method::POST,
            "/tasks",
            Some(&serde_json::json!({ "title": "Orphan", "user_id": 999 })),
        )
        .await;
        assert_eq!(StatusCode::NOT_FOUND, status);

        let (status, body) = send(
            &router,
            Method::POST,
            "/tasks",
            Some(&serde_json::json!({ "title": "x".repeat(201) })),
        )
        .await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        let error_body: serde_json::Value = parse(&body);
        assert_eq!("invalid_input", error_body["error_code"]);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn simultaneous_duplicate_users_create_only_one() {
    const SIMULTANEOUS_REQUESTS: usize = 12;

    test_util::prepare_db_and_test(|db| async move {
        let router = router_for(db.clone());

        for round in 0..10 {
            let barrier = Arc::new(Barrier::new(SIMULTANEOUS_REQUESTS));
            let mut requests = JoinSet::new();
            for _ in 0..SIMULTANEOUS_REQUESTS {
                let router = router.clone();
                let barrier = Arc::clone(&barrier);
                requests.spawn(async move {
                    let new_user = dto::NewUser {
                        first_name: format!("Jane{round}"),
                        last_name: "Doe".to_owned(),
                    };
                    barrier.wait().await;

                    send(&router, Method::POST, "/users", Some(&new_user)).await.0
                });
            }

            let mut statuses = Vec::new();
            while let Some(joined) = requests.join_next().await {
                statuses.push(joined.expect("Request task panicked"));
            }
            let created = statuses
                .iter()
                .filter(|status| **status == StatusCode::CREATED)
                .count();
            let conflicts = statuses
                .iter()
                .filter(|status| **status == StatusCode::CONFLICT)
                .count();
            assert_eq!(1, created, "round {round} statuses: {statuses:?}");
            assert_eq!(
                SIMULTANEOUS_REQUESTS - 1,
                conflicts,
                "round {round} statuses: {statuses:?}"
            );
        }

        let stored_users = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM todo_user")
            .fetch_one(&db)
            .await
            .expect("Could not count users");
        assert_eq!(10, stored_users);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn unreadable_requests_get_shared_error_body() {
    test_util::prepare_db_and_test(|db| async move {
        let router = router_for(db);

        let malformed = Request::builder()
            .method(Method::POST)
            .uri("/tasks")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{"))
            .expect("Could not build request");
        let response = router
            .clone()
            .oneshot(malformed)
            .await
            .expect("Router failed to respond");
        assert_eq!(StatusCode::BAD_REQUEST, response.status());
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Could not read response body");
        let error_body: serde_json::Value = parse(&bytes);
        assert_eq!("invalid_json", error_body["error_code"]);

        let (status, body) = send(&router, Method::GET, "/tasks/abc", NO_BODY).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        let error_body: serde_json::Value = parse(&body);
        assert_eq!("invalid_path", error_body["error_code"]);

        let (status, body) = send(&router, Method::DELETE, "/users/abc", NO_BODY).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        let error_body: serde_json::Value = parse(&body);
        assert_eq!("invalid_path", error_body["error_code"]);
    });
}
