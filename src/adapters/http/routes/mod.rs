use axum::{
    Router,
    http::{HeaderMap, HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{adapters::http::app_state::AppState, app_error::AppError};

pub mod auth;
pub mod user;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/user", user::router())
        .nest("/test", test::router())
        .route("/callback", get(auth::callback))
}

/// 302 to `location`, carrying `headers` (usually cookies).
pub(crate) fn found(location: &str, mut headers: HeaderMap) -> Result<Response, AppError> {
    let value = HeaderValue::from_str(location)
        .map_err(|_| AppError::Internal("Invalid redirect location".into()))?;
    headers.insert(LOCATION, value);
    Ok((StatusCode::FOUND, headers).into_response())
}
