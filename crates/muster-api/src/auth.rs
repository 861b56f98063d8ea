use std::sync::Arc;

use anyhow::anyhow;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::warn;

use muster_db::Database;
use muster_types::api::{CheckResponse, LoginRequest};
use muster_types::error::ApiError;

use crate::credential;
use crate::session::{SESSION_COOKIE, Session, SessionStore};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionStore,
}

/// `POST /login` — verify credentials and bind a fresh session.
///
/// Unknown username and wrong password are both a plain 401; the unknown
/// path still burns a verification so timing does not separate them.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, StatusCode), ApiError> {
    let Some(user) = state.db.get_user_by_username(&req.username)? else {
        let password = req.password;
        tokio::task::spawn_blocking(move || credential::verify_dummy(&password))
            .await
            .map_err(|e| anyhow!("verifier task failed: {e}"))?;
        return Err(ApiError::Unauthorized);
    };

    // Argon2 is deliberately slow; keep it off the async workers
    let password = req.password;
    let stored = user.password.clone();
    let matched = tokio::task::spawn_blocking(move || credential::verify(&password, &stored))
        .await
        .map_err(|e| anyhow!("verifier task failed: {e}"))?
        .map_err(|e| ApiError::Internal(anyhow!(e)))?;

    if !matched {
        warn!("failed login attempt for {}", user.username);
        return Err(ApiError::Unauthorized);
    }

    // A user row without a usable id is corrupt state, not a bad login
    if user.id <= 0 {
        return Err(ApiError::Internal(anyhow!(
            "user {} has no valid id",
            user.username
        )));
    }

    let token = state.sessions.create(user.id);
    let jar = jar.add(
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true),
    );

    Ok((jar, StatusCode::OK))
}

/// `GET /logout` — unconditionally drops the session; repeating it on an
/// already-dead session is still a 200.
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    if let Some(token) = &session.token {
        state.sessions.invalidate(token);
    }

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"));
    (jar, StatusCode::OK)
}

/// `GET /check` — 401 with no live session, 404 if the bound user was
/// deleted out from under the session, otherwise the public identity.
pub async fn check(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.user_id.ok_or(ApiError::Unauthorized)?;

    let user = state
        .db
        .get_user_by_id(user_id)?
        .ok_or_else(|| ApiError::not_found(format!("no user with id {user_id}")))?;

    Ok(Json(CheckResponse {
        id: user.id,
        username: user.username,
    }))
}
