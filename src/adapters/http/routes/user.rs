use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use serde_json::Value;

use crate::{
    adapters::http::{app_state::AppState, protect::protect},
    app_error::AppError,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    user_id: String,
    name: String,
    username: Option<String>,
    email: Option<String>,
    picture: Option<String>,
    /// Provider's user record; null when it could not be fetched
    profile: Option<Value>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(profile))
}

async fn profile(State(app_state): State<AppState>, jar: CookieJar) -> Response {
    let app = &app_state;
    protect(app, &jar, "user/profile", move |identity| async move {
        let profile = match app.management.get_user(&identity.user_id).await {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(user_id = %identity.user_id, error = %e, "Profile record unavailable");
                None
            }
        };

        let info = identity.user_info;
        Ok::<_, AppError>(
            Json(ProfileResponse {
                user_id: identity.user_id,
                name: info.name,
                username: info.username,
                email: info.email,
                picture: info.picture,
                profile,
            })
            .into_response(),
        )
    })
    .await
}
