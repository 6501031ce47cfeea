//! Client configuration and the shared client value.

mod config;
mod metascan_client;

pub use config::{ClientConfig, Endpoints, ENV_API_KEY, ENV_BASE_URL};
pub use metascan_client::Client;
