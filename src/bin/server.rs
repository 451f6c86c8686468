use scaling_bloom_rs::api::create_router;
use scaling_bloom_rs::keyspace::Keyspace;
use scaling_bloom_rs::types::AppState;
use scaling_bloom_rs::ServerConfig;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    // Initialize tracing
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();

    // load configuration from environment variables
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Create application state with an empty keyspace
    let state = Arc::new(AppState {
        keyspace: tokio::sync::Mutex::new(Keyspace::new()),
    });

    // Create router with logging middleware
    let app = create_router(state.clone()).layer(
        tower_http::trace::TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    tracing::info!(
                        status = %response.status(),
                        latency = ?latency,
                        "response generated"
                    );
                },
            ),
    );

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");

    info!(
        r#"
    Scalable Bloom Filter Server

    Chains are created on first BFADD and grow on demand; an empty
    keyspace costs nothing until the first insert.

    Server Information:
       - Listening on:  http://{}
       - Swagger UI:    http://{}/swagger-ui/
       - Health Check:  http://{}/health

    API Endpoints:
       - POST   /keys/:key/elements         - Insert elements (BFADD)
       - GET    /keys/:key/elements/:value  - Query membership (BFEXIST)
       - GET    /keys/:key/cardinality      - Estimate cardinality (BFCOUNT)
       - GET    /keys/:key/status           - Chain status
       - GET    /keys/:key/filters/:index   - Per-filter counters
       - DELETE /keys/:key                  - Drop a chain
    "#,
        addr, addr, addr,
    );

    info!("Starting server on {}", addr);
    axum::serve(listener, app).await.expect("Server error");
}
