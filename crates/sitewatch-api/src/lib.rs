// sitewatch-api: Async Rust client for the sitewatch monitoring backend

pub mod auth;
pub mod certificates;
pub mod client;
pub mod error;
pub mod sites;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use error::Error;
pub use transport::TransportConfig;
