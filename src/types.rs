use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use utoipa::ToSchema;

use crate::keyspace::Keyspace;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddRequest {
    /// Elements to insert, in order.
    #[serde(default)]
    pub elements: Vec<String>,
    /// Target error rate; only honored while the chain is newly created.
    pub error_rate: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddResponse {
    pub novel: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    pub cardinality: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub num_filters: usize,
    pub error_rate: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FilterResponse {
    pub num_partitions: u32,
    pub partition_bits: u64,
    pub bits_set: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

pub struct AppState {
    pub keyspace: Mutex<Keyspace>,
}

#[derive(Builder, Clone)]
#[builder(pattern = "owned")]
pub struct ServerConfig {
    #[builder(default = "\"127.0.0.1\".to_string()")]
    pub server_host: String,
    #[builder(default = "3000")]
    pub server_port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| "Invalid SERVER_PORT")?,
        })
    }
}
