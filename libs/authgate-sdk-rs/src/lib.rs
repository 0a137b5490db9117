//! Rust client for authgate.
//!
//! # Features
//!
//! - **Coordinated refresh** - concurrent requests that hit a 401 share one
//!   `POST /api/auth/refresh` and are each retried at most once
//! - **Proactive refresh** - sessions close to expiry are refreshed before
//!   the request goes out
//! - **Typed API** - status, encryption key, password change, profile
//!
//! # Example
//!
//! ```rust,ignore
//! use authgate_sdk::{AuthgateClient, ClientConfig};
//!
//! let client = AuthgateClient::new(ClientConfig::new("https://app.example.com"))?
//!     .on_unauthorized(|| println!("please sign in again"));
//!
//! client.change_password("old-secret", "new-secret-1").await?;
//! ```

mod client;
mod coordinator;
mod error;
mod state;
mod transport;

#[cfg(test)]
mod test_support;

pub use client::{AuthgateClient, ClientConfig};
pub use coordinator::{RefreshCoordinator, UnauthorizedHandler};
pub use error::SdkError;
pub use state::{RefreshOutcome, RefreshState, RefreshStateHandle};
#[cfg(feature = "client")]
pub use transport::HttpTransport;
pub use transport::{ApiRequest, ApiResponse, Method, Transport};

// Re-export shared types for convenience
pub use authgate_types::{
    AuthResult, ChangePasswordResponse, ErrorCode, SessionClaims, StatusResponse, UserInfo,
};
