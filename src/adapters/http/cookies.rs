//! Sealed cookies: the session, the password key escrow and the pending
//! sign-in.

use axum::{
    http::{HeaderMap, HeaderValue},
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    domain::entities::session::SessionSlot,
};

pub const SESSION_COOKIE: &str = "authgate_session";
/// Holds the obfuscation key issued by `/auth/encryption-key` until the
/// password change that uses it.
pub const KEY_ESCROW_COOKIE: &str = "authgate_pwkey";
pub const SIGN_IN_COOKIE: &str = "authgate_signin";

const SESSION_TTL: time::Duration = time::Duration::days(14);
pub const KEY_ESCROW_TTL: time::Duration = time::Duration::minutes(5);
pub const SIGN_IN_TTL: time::Duration = time::Duration::minutes(10);

/// Appends a cookie to the headers, handling parse errors gracefully
pub(crate) fn append_cookie(headers: &mut HeaderMap, cookie: Cookie<'_>) -> Result<(), AppError> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|_| AppError::Internal("Failed to build cookie header".into()))?;
    headers.append("set-cookie", value);
    Ok(())
}

fn build_cookie(
    state: &AppState,
    name: &'static str,
    value: String,
    max_age: time::Duration,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

pub(crate) fn sealed_cookie<T: Serialize>(
    state: &AppState,
    name: &'static str,
    value: &T,
    max_age: time::Duration,
) -> AppResult<Cookie<'static>> {
    let sealed = state.sealer.seal(name, value)?;
    Ok(build_cookie(state, name, sealed, max_age))
}

pub(crate) fn removal_cookie(state: &AppState, name: &'static str) -> Cookie<'static> {
    build_cookie(state, name, String::new(), time::Duration::seconds(0))
}

/// Unsealed cookie value. Missing and unreadable cookies are both `None`.
pub(crate) fn read_sealed<T: DeserializeOwned>(
    state: &AppState,
    jar: &CookieJar,
    name: &'static str,
) -> Option<T> {
    let cookie = jar.get(name)?;
    match state.sealer.unseal(name, cookie.value()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(cookie = name, error = %e, "Ignoring unreadable cookie");
            None
        }
    }
}

/// Session behind the request. A tampered or stale cookie reads as no session.
pub fn read_session(state: &AppState, jar: &CookieJar) -> SessionSlot {
    match read_sealed(state, jar, SESSION_COOKIE) {
        Some(tokens) => SessionSlot::with_tokens(tokens),
        None => SessionSlot::empty(),
    }
}

/// Write the rotated session back onto `response`.
pub fn finish(state: &AppState, slot: &SessionSlot, mut response: Response) -> Response {
    if !slot.rotated {
        return response;
    }
    let Some(tokens) = &slot.tokens else {
        return response;
    };
    let result = sealed_cookie(state, SESSION_COOKIE, tokens, SESSION_TTL)
        .and_then(|cookie| append_cookie(response.headers_mut(), cookie));
    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to write refreshed session cookie");
    }
    response
}

/// Fresh session cookie after sign-in.
pub(crate) fn session_cookie(
    state: &AppState,
    slot: &SessionSlot,
) -> AppResult<Option<Cookie<'static>>> {
    slot.tokens
        .as_ref()
        .map(|tokens| sealed_cookie(state, SESSION_COOKIE, tokens, SESSION_TTL))
        .transpose()
}
