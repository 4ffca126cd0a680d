use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::auth::Session;
use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "pantau_session";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Resolve the session carried by the request cookie, if still live.
pub fn current_session(state: &AppState, jar: &CookieJar) -> Option<Session> {
    let cookie = jar.get(SESSION_COOKIE)?;
    state
        .sessions
        .get_active(cookie.value(), Utc::now(), state.config.session_timeout)
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let role = state
        .users
        .verify(&req.username, &req.password)
        .ok_or_else(|| ApiError::Auth("Invalid username or password".to_string()))?;

    let token = Uuid::new_v4().to_string();
    info!("Creating session for user '{}' ({})", req.username, role);
    state.sessions.insert(
        token.clone(),
        Session {
            username: req.username.clone(),
            role: role.clone(),
            login_time: Utc::now(),
        },
    );

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build();

    Ok((
        jar.add(cookie),
        Json(json!({
            "message": "Login successful",
            "username": req.username,
            "role": role,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    ))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value());
    }

    let mut removal = Cookie::from(SESSION_COOKIE);
    removal.set_path("/");

    (
        jar.remove(removal),
        Json(json!({
            "message": "Logged out",
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state_with_temp_store;

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let (_dir, state) = state_with_temp_store().await;

        let err = login(
            State(state),
            CookieJar::new(),
            Json(LoginRequest {
                username: "admin".to_string(),
                password: "nope".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Auth(_)));
    }

    #[tokio::test]
    async fn login_issues_a_session_cookie_that_resolves() {
        let (_dir, state) = state_with_temp_store().await;

        let (jar, body) = login(
            State(state.clone()),
            CookieJar::new(),
            Json(LoginRequest {
                username: "admin".to_string(),
                password: "password".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(body.0["role"], "admin");

        let session = current_session(&state, &jar).expect("session resolves");
        assert_eq!(session.username, "admin");
    }

    #[tokio::test]
    async fn logout_invalidates_the_session() {
        let (_dir, state) = state_with_temp_store().await;

        let (jar, _) = login(
            State(state.clone()),
            CookieJar::new(),
            Json(LoginRequest {
                username: "user".to_string(),
                password: "user123".to_string(),
            }),
        )
        .await
        .unwrap();

        let token = jar.get(SESSION_COOKIE).unwrap().value().to_string();
        logout(State(state.clone()), jar).await;

        assert!(
            state
                .sessions
                .get_active(&token, Utc::now(), state.config.session_timeout)
                .is_none()
        );
    }
}
