use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers::{self, AppState};
use crate::store::PersonStore;

pub fn create_router<S: PersonStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Person collection
        .route(
            "/person",
            get(handlers::list_persons::<S>).post(handlers::create_person::<S>),
        )
        .route(
            "/person/:id",
            get(handlers::get_person::<S>).patch(handlers::update_person::<S>),
        )
        // Parent relationships
        .route(
            "/person/:id/parents",
            post(handlers::add_parents::<S>).put(handlers::replace_parents::<S>),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::{AppContext, ErrorResponse};
    use crate::logic::{Paginator, PersonService};
    use crate::model::PersonDto;
    use crate::store::MemoryStore;
    use axum::{
        body::{to_bytes, Body},
        http::{header, HeaderMap, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let service = PersonService::new(Arc::new(MemoryStore::new()), Paginator::default());
        create_router().with_state(Arc::new(AppContext {
            service,
            default_page_size: 20,
        }))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, headers, value)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, _, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_create_returns_location_and_person() {
        let app = app();
        let (status, headers, body) = send(
            &app,
            Method::POST,
            "/person",
            Some(json!({"name": "testperson"})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers[header::LOCATION], "/person/1");
        assert_eq!(body, json!({"id": 1, "name": "testperson", "parentIds": []}));
    }

    #[tokio::test]
    async fn test_create_ignores_client_supplied_id() {
        let app = app();
        let (_, _, body) = send(
            &app,
            Method::POST,
            "/person",
            Some(json!({"id": 77, "name": "testperson"})),
        )
        .await;

        assert_eq!(body["id"], 1);
        let (status, _, _) = send(&app, Method::GET, "/person/77", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_blank_name_is_bad_request() {
        let (status, _, body) = send(
            &app(),
            Method::POST,
            "/person",
            Some(json!({"name": ""})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorResponse = serde_json::from_value(body).unwrap();
        assert_eq!(error.error, "name must not be blank");
    }

    #[tokio::test]
    async fn test_list_defaults_are_clamped() {
        let app = app();
        for i in 0..7 {
            send(
                &app,
                Method::POST,
                "/person",
                Some(json!({"name": format!("person{}", i)})),
            )
            .await;
        }

        let (status, _, body) = send(&app, Method::GET, "/person", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["size"], 5);
        assert_eq!(body["number"], 0);
        assert_eq!(body["totalElements"], 7);
        assert_eq!(body["content"].as_array().unwrap().len(), 5);

        let uri = "/person?page=1&size=20&sort=id,desc";
        let (_, _, body) = send(&app, Method::GET, uri, None).await;
        let ids: Vec<i64> = body["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_sort() {
        let (status, _, _) = send(&app(), Method::GET, "/person?sort=age", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_missing_person_is_not_found() {
        let (status, _, body) = send(&app(), Method::GET, "/person/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Person not found");
    }

    #[tokio::test]
    async fn test_patch_merges_and_put_replaces() {
        let app = app();
        for name in ["p1", "p2", "p3"] {
            send(&app, Method::POST, "/person", Some(json!({"name": name}))).await;
        }
        send(
            &app,
            Method::POST,
            "/person",
            Some(json!({"name": "child", "parentIds": [1]})),
        )
        .await;

        let (status, _, body) = send(
            &app,
            Method::PATCH,
            "/person/4",
            Some(json!({"parentIds": [2, 99]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let person: PersonDto = serde_json::from_value(body).unwrap();
        assert_eq!(person.name, "child");
        assert_eq!(person.parent_ids.len(), 2);

        let (status, _, body) = send(
            &app,
            Method::PUT,
            "/person/4/parents",
            Some(json!({"parentIds": [3, 3]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["parentIds"], json!([3]));

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/person/4/parents",
            Some(json!({"parentIds": [1]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["parentIds"], json!([1, 3]));
    }

    #[tokio::test]
    async fn test_update_missing_person_is_not_found() {
        let app = app();
        let (status, _, _) = send(
            &app,
            Method::PATCH,
            "/person/99",
            Some(json!({"name": "ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(
            &app,
            Method::PUT,
            "/person/99/parents",
            Some(json!({"parentIds": []})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, _, body) = send(&app, Method::GET, "/person", None).await;
        assert_eq!(body["totalElements"], 0);
    }
}
