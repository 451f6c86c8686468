use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::debug;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::commands::{self, CommandError, Reply};
use crate::keyspace::Value;
use crate::types::{
    AddRequest, AddResponse, AppState, CountResponse, ErrorResponse,
    ExistsResponse, FilterResponse, StatusResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        add_elements,
        query_element,
        count_elements,
        chain_status,
        filter_status,
        delete_chain,
    ),
    components(
        schemas(
            AddRequest,
            AddResponse,
            ExistsResponse,
            CountResponse,
            StatusResponse,
            FilterResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "bloom-chain", description = "Scalable Bloom Filter API")
    )
)]
struct ApiDoc;

fn error_status(error: &CommandError) -> StatusCode {
    match error {
        CommandError::MissingKey => StatusCode::NOT_FOUND,
        CommandError::ErrorConflict => StatusCode::CONFLICT,
        CommandError::WrongType => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn error_reply(error: CommandError) -> axum::response::Response {
    (
        error_status(&error),
        Json(ErrorResponse {
            message: error.to_string(),
        }),
    )
        .into_response()
}

/// Check API health
#[utoipa::path(
    get,
    path = "/health",
    tag = "bloom-chain",
    responses(
        (status = 200, description = "API is healthy")
    )
)]
async fn health_check() -> impl IntoResponse {
    debug!("Health check");
    StatusCode::OK
}

/// Insert elements into the named chain, creating it on first use
#[utoipa::path(
    post,
    path = "/keys/{key}/elements",
    tag = "bloom-chain",
    request_body = AddRequest,
    params(
        ("key" = String, Path, description = "Chain name")
    ),
    responses(
        (status = 200, description = "Elements inserted", body = AddResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Conflicting configuration", body = ErrorResponse)
    )
)]
async fn add_elements(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(request): Json<AddRequest>,
) -> impl IntoResponse {
    debug!(key = %key, count = request.elements.len(), "add elements");

    let mut argv: Vec<Vec<u8>> = vec![b"BFADD".to_vec(), key.into_bytes()];
    if let Some(rate) = request.error_rate {
        argv.push(b"ERROR".to_vec());
        argv.push(rate.to_string().into_bytes());
    }
    if !request.elements.is_empty() {
        argv.push(b"ELEMENTS".to_vec());
        argv.extend(request.elements.iter().map(|e| e.as_bytes().to_vec()));
    }
    let argv: Vec<&[u8]> = argv.iter().map(Vec::as_slice).collect();

    let mut keyspace = state.keyspace.lock().await;
    match commands::dispatch(&mut keyspace, &argv) {
        Ok(Reply::Integer(novel)) => {
            (StatusCode::OK, Json(AddResponse { novel })).into_response()
        }
        Ok(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Err(error) => error_reply(error),
    }
}

/// Query membership of a single element
#[utoipa::path(
    get,
    path = "/keys/{key}/elements/{value}",
    tag = "bloom-chain",
    params(
        ("key" = String, Path, description = "Chain name"),
        ("value" = String, Path, description = "Element to query")
    ),
    responses(
        (status = 200, description = "Query successful", body = ExistsResponse),
        (status = 409, description = "Wrong value type", body = ErrorResponse)
    )
)]
async fn query_element(
    State(state): State<Arc<AppState>>,
    Path((key, value)): Path<(String, String)>,
) -> impl IntoResponse {
    debug!(key = %key, "query element");
    let keyspace = state.keyspace.lock().await;
    let argv: [&[u8]; 3] = [b"BFEXIST", key.as_bytes(), value.as_bytes()];
    match commands::bfexist(&keyspace, &argv) {
        Ok(Reply::Integer(found)) => (
            StatusCode::OK,
            Json(ExistsResponse { exists: found != 0 }),
        )
            .into_response(),
        Ok(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Err(error) => error_reply(error),
    }
}

/// Estimate the number of distinct elements in the chain
#[utoipa::path(
    get,
    path = "/keys/{key}/cardinality",
    tag = "bloom-chain",
    params(
        ("key" = String, Path, description = "Chain name")
    ),
    responses(
        (status = 200, description = "Estimate computed", body = CountResponse),
        (status = 409, description = "Wrong value type", body = ErrorResponse)
    )
)]
async fn count_elements(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    let keyspace = state.keyspace.lock().await;
    let argv: [&[u8]; 2] = [b"BFCOUNT", key.as_bytes()];
    match commands::bfcount(&keyspace, &argv) {
        Ok(Reply::Integer(cardinality)) => {
            (StatusCode::OK, Json(CountResponse { cardinality }))
                .into_response()
        }
        Ok(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Err(error) => error_reply(error),
    }
}

/// Chain-level status: filter count and configured error rate
#[utoipa::path(
    get,
    path = "/keys/{key}/status",
    tag = "bloom-chain",
    params(
        ("key" = String, Path, description = "Chain name")
    ),
    responses(
        (status = 200, description = "Status", body = StatusResponse),
        (status = 404, description = "No such key", body = ErrorResponse)
    )
)]
async fn chain_status(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    let keyspace = state.keyspace.lock().await;
    match keyspace.get(&key) {
        Some(Value::Bloom(chain)) => (
            StatusCode::OK,
            Json(StatusResponse {
                num_filters: chain.num_filters(),
                error_rate: chain.error_rate(),
            }),
        )
            .into_response(),
        Some(_) => error_reply(CommandError::WrongType),
        None => error_reply(CommandError::MissingKey),
    }
}

/// Per-filter counters for one ring of the chain
#[utoipa::path(
    get,
    path = "/keys/{key}/filters/{index}",
    tag = "bloom-chain",
    params(
        ("key" = String, Path, description = "Chain name"),
        ("index" = usize, Path, description = "Filter position, oldest first")
    ),
    responses(
        (status = 200, description = "Filter counters", body = FilterResponse),
        (status = 400, description = "Index out of range", body = ErrorResponse),
        (status = 404, description = "No such key", body = ErrorResponse)
    )
)]
async fn filter_status(
    State(state): State<Arc<AppState>>,
    Path((key, index)): Path<(String, usize)>,
) -> impl IntoResponse {
    let keyspace = state.keyspace.lock().await;
    match keyspace.get(&key) {
        Some(Value::Bloom(chain)) => match chain.filter(index) {
            Ok(filter) => (
                StatusCode::OK,
                Json(FilterResponse {
                    num_partitions: filter.params().num_partitions,
                    partition_bits: filter.params().partition_bits,
                    bits_set: filter.bits_set(),
                }),
            )
                .into_response(),
            Err(_) => error_reply(CommandError::FilterIndexOutOfRange),
        },
        Some(_) => error_reply(CommandError::WrongType),
        None => error_reply(CommandError::MissingKey),
    }
}

/// Drop the named chain
#[utoipa::path(
    delete,
    path = "/keys/{key}",
    tag = "bloom-chain",
    params(
        ("key" = String, Path, description = "Chain name")
    ),
    responses(
        (status = 200, description = "Key removed"),
        (status = 404, description = "No such key", body = ErrorResponse)
    )
)]
async fn delete_chain(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    let mut keyspace = state.keyspace.lock().await;
    match keyspace.remove(&key) {
        Some(_) => StatusCode::OK.into_response(),
        None => error_reply(CommandError::MissingKey),
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let openapi = ApiDoc::openapi();

    Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi),
        )
        .route("/health", get(health_check))
        .route("/keys/{key}/elements", post(add_elements))
        .route("/keys/{key}/elements/{value}", get(query_element))
        .route("/keys/{key}/cardinality", get(count_elements))
        .route("/keys/{key}/status", get(chain_status))
        .route("/keys/{key}/filters/{index}", get(filter_status))
        .route("/keys/{key}", delete(delete_chain))
        .with_state(state)
}
