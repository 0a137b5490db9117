use thiserror::Error;

/// Infrastructure errors that can occur during application startup.
///
/// SECURITY: Display messages never include secret values. Use Display (%e)
/// rather than Debug (?e) when logging the #[source] chain.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Configuration error: {var} {reason}")]
    ConfigInvalid {
        var: &'static str,
        reason: &'static str,
    },

    #[error("HTTP client initialization failed")]
    HttpClient(#[source] reqwest::Error),

    #[error("TCP bind failed")]
    TcpBind(#[source] std::io::Error),

    #[error("Server error")]
    Server(#[source] std::io::Error),
}

impl From<reqwest::Error> for InfraError {
    fn from(e: reqwest::Error) -> Self {
        InfraError::HttpClient(e)
    }
}
