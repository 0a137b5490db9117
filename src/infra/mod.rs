pub mod app;
pub mod audit;
pub mod config;
pub mod crypto;
pub mod error;
pub mod http_client;
pub mod management;
pub mod oidc_session;
pub mod setup;

pub use error::InfraError;
