//! Server-side sessions: an opaque v4 UUID token in a cookie, mapped to
//! a user id in memory. The session reaches handlers as an explicit
//! [`Session`] value via the extractor — never through ambient state.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Mutex;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;
use uuid::Uuid;

use muster_db::models::UserRow;
use muster_policy::Entitlements;
use muster_types::error::ApiError;

use crate::auth::AppState;

pub const SESSION_COOKIE: &str = "muster_session";

#[derive(Default)]
pub struct SessionStore {
    tokens: Mutex<HashMap<String, i64>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, user_id: i64) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens
            .lock()
            .expect("session store lock poisoned")
            .insert(token.clone(), user_id);
        debug!("session created for user {user_id}");
        token
    }

    pub fn resolve(&self, token: &str) -> Option<i64> {
        self.tokens
            .lock()
            .expect("session store lock poisoned")
            .get(token)
            .copied()
    }

    /// Idempotent: invalidating an unknown token is a no-op.
    pub fn invalidate(&self, token: &str) {
        self.tokens
            .lock()
            .expect("session store lock poisoned")
            .remove(token);
    }
}

/// The request's session, resolved once from the cookie jar. `user_id`
/// is `None` both when no cookie was sent and when the token is no
/// longer live — callers cannot tell the two apart, by contract.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: Option<String>,
    pub user_id: Option<i64>,
}

impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
        let user_id = token.as_deref().and_then(|t| state.sessions.resolve(t));

        Ok(Session { token, user_id })
    }
}

/// Resolves the acting principal or fails with 401. A session whose user
/// row has vanished counts as unauthenticated here; only `/check` maps
/// that case to 404.
pub fn require_user(state: &AppState, session: &Session) -> Result<UserRow, ApiError> {
    let user_id = session.user_id.ok_or(ApiError::Unauthorized)?;
    state
        .db
        .get_user_by_id(user_id)?
        .ok_or(ApiError::Unauthorized)
}

/// Entitlement data for the policy engine, fetched up front so the
/// policy functions stay pure.
pub fn entitlements(state: &AppState, user_id: i64) -> Result<Entitlements, ApiError> {
    Ok(Entitlements {
        user_id,
        administered: state.db.administered_group_ids(user_id)?,
        elevated: state.db.is_elevated(user_id)?,
    })
}
