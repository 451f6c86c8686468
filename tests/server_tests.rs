#[cfg(test)]
mod tests {
    use axum::{
        body::{self, Body},
        http::{Request, StatusCode},
        Router,
    };
    use scaling_bloom_rs::api::create_router;
    use scaling_bloom_rs::{AppState, Keyspace};
    use serde_json::json;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn setup_test_app() -> Router {
        let state = Arc::new(AppState {
            keyspace: tokio::sync::Mutex::new(Keyspace::new()),
        });
        create_router(state)
    }

    async fn read_json(response: axum::response::Response) -> serde_json::Value {
        let body_bytes = body::to_bytes(response.into_body(), 4096)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_insert_and_query() {
        let app = setup_test_app();

        let insert_response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/keys/bloom/elements")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"elements": ["apple", "banana"]}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(insert_response.status(), StatusCode::OK);
        let response = read_json(insert_response).await;
        assert_eq!(response["novel"], 2);

        let query_response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/keys/bloom/elements/apple")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(query_response.status(), StatusCode::OK);
        let response = read_json(query_response).await;
        assert_eq!(response["exists"], true);

        let query_response = app
            .oneshot(
                Request::builder()
                    .uri("/keys/bloom/elements/grape")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let response = read_json(query_response).await;
        assert_eq!(response["exists"], false);
    }

    #[tokio::test]
    async fn test_error_rate_conflict() {
        let app = setup_test_app();

        let create_response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/keys/bloom/elements")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"elements": ["a"], "error_rate": 0.1})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(create_response.status(), StatusCode::OK);

        let conflict_response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/keys/bloom/elements")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"elements": ["b"], "error_rate": 0.2})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(conflict_response.status(), StatusCode::CONFLICT);
        let response = read_json(conflict_response).await;
        assert_eq!(
            response["message"],
            "cannot change error on existing bloom filter"
        );
    }

    #[tokio::test]
    async fn test_status_and_filters() {
        let app = setup_test_app();

        let missing = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/keys/bloom/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/keys/bloom/elements")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"elements": ["a", "b", "c"]}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status_response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/keys/bloom/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(status_response.status(), StatusCode::OK);
        let response = read_json(status_response).await;
        assert_eq!(response["num_filters"], 1);
        assert_eq!(response["error_rate"], 0.003);

        let filter_response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/keys/bloom/filters/0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(filter_response.status(), StatusCode::OK);
        let response = read_json(filter_response).await;
        assert!(response["bits_set"].as_u64().unwrap() > 0);

        let out_of_range = app
            .oneshot(
                Request::builder()
                    .uri("/keys/bloom/filters/5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_chain() {
        let app = setup_test_app();

        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/keys/bloom/elements")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"elements": ["a"]}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let delete_response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/keys/bloom")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(delete_response.status(), StatusCode::OK);

        let query_response = app
            .oneshot(
                Request::builder()
                    .uri("/keys/bloom/elements/a")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let response = read_json(query_response).await;
        assert_eq!(response["exists"], false);
    }
}
