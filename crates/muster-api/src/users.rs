use std::collections::BTreeSet;

use anyhow::anyhow;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use muster_db::models::UserRow;
use muster_policy::{filter_add_groups, filter_delete_groups};
use muster_types::api::{
    GroupIdsRequest, GroupResponse, RegisterRequest, UserDetailResponse, UserPatch, UserResponse,
};
use muster_types::error::ApiError;

use crate::auth::AppState;
use crate::session::{Session, entitlements, require_user};
use crate::{credential, parse_id};

fn to_response(row: UserRow) -> UserResponse {
    UserResponse {
        id: row.id,
        username: row.username,
        created_at: row.created_at,
    }
}

/// `GET /users`
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.db.list_users()?;
    Ok(Json(users.into_iter().map(to_response).collect::<Vec<_>>()))
}

/// `GET /users/{userId}` — the user with its groups.
pub async fn show(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id(&user_id, "user")?;

    let user = state
        .db
        .get_user_by_id(user_id)?
        .ok_or_else(|| ApiError::not_found(format!("no user with id {user_id}")))?;

    let groups = state
        .db
        .groups_for_user(user_id)?
        .into_iter()
        .map(|g| GroupResponse { id: g.id, name: g.name })
        .collect();

    Ok(Json(UserDetailResponse {
        id: user.id,
        username: user.username,
        created_at: user.created_at,
        groups,
    }))
}

/// `POST /users` — registration; open, like login.
pub async fn store(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::bad_request("username must be 3-32 characters"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::bad_request("password must be at least 8 characters"));
    }

    if state.db.get_user_by_username(&req.username)?.is_some() {
        return Err(ApiError::Conflict("username already taken".into()));
    }

    let password = req.password;
    let hash = tokio::task::spawn_blocking(move || credential::hash(&password))
        .await
        .map_err(|e| anyhow!("hasher task failed: {e}"))?
        .map_err(|e| ApiError::Internal(anyhow!(e)))?;

    let id = state.db.create_user(&req.username, &hash)?;
    let user = state
        .db
        .get_user_by_id(id)?
        .ok_or_else(|| ApiError::Internal(anyhow!("user {id} vanished after insert")))?;

    Ok((StatusCode::CREATED, Json(to_response(user))))
}

/// `PATCH /users/{userId}` — self or elevated only.
pub async fn update(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    session: Session,
    Json(patch): Json<UserPatch>,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_id(&user_id, "user")?;

    let acting = require_user(&state, &session)?;

    if state.db.get_user_by_id(user_id)?.is_none() {
        return Err(ApiError::not_found(format!("no user with id {user_id}")));
    }

    let ent = entitlements(&state, acting.id)?;
    if acting.id != user_id && !ent.elevated {
        return Err(ApiError::Unauthorized);
    }

    let hash = match patch.password {
        Some(password) => Some(
            tokio::task::spawn_blocking(move || credential::hash(&password))
                .await
                .map_err(|e| anyhow!("hasher task failed: {e}"))?
                .map_err(|e| ApiError::Internal(anyhow!(e)))?,
        ),
        None => None,
    };

    state
        .db
        .update_user(user_id, patch.username.as_deref(), hash.as_deref())?;

    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /users/{userId}` — elevated only; drops membership edges too.
pub async fn delete(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    session: Session,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_id(&user_id, "user")?;

    let acting = require_user(&state, &session)?;

    if state.db.get_user_by_id(user_id)?.is_none() {
        return Err(ApiError::not_found(format!("no user with id {user_id}")));
    }

    let ent = entitlements(&state, acting.id)?;
    if !ent.elevated {
        return Err(ApiError::Unauthorized);
    }

    state.db.delete_user(user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /users/{userId}/groups`
pub async fn get_groups(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id(&user_id, "user")?;

    if state.db.get_user_by_id(user_id)?.is_none() {
        return Err(ApiError::not_found(format!("no user with id {user_id}")));
    }

    let groups: Vec<GroupResponse> = state
        .db
        .groups_for_user(user_id)?
        .into_iter()
        .map(|g| GroupResponse { id: g.id, name: g.name })
        .collect();

    Ok(Json(groups))
}

/// `POST /users/{userId}/groups` — grant the permitted subset of the
/// requested memberships. Denied or unknown ids are dropped silently; an
/// all-denied request is applied as a no-op and still answers 204.
pub async fn add_groups(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    session: Session,
    Json(req): Json<GroupIdsRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_id(&user_id, "user")?;

    let acting = require_user(&state, &session)?;

    if state.db.get_user_by_id(user_id)?.is_none() {
        return Err(ApiError::not_found(format!("no user with id {user_id}")));
    }

    let requested: BTreeSet<i64> = req.groups_id.into_iter().collect();
    let existing = state.db.existing_group_ids(&requested)?;
    let ent = entitlements(&state, acting.id)?;

    let permitted = filter_add_groups(&requested, &existing, &ent);
    state.db.add_memberships(user_id, &permitted)?;

    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /users/{userId}/groups` — same shape as the add, with the
/// self-leave rule applied by the policy layer.
pub async fn delete_groups(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    session: Session,
    Json(req): Json<GroupIdsRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_id(&user_id, "user")?;

    let acting = require_user(&state, &session)?;

    if state.db.get_user_by_id(user_id)?.is_none() {
        return Err(ApiError::not_found(format!("no user with id {user_id}")));
    }

    let requested: BTreeSet<i64> = req.groups_id.into_iter().collect();
    let existing = state.db.existing_group_ids(&requested)?;
    let memberships = state.db.group_ids_for_user(user_id)?;
    let ent = entitlements(&state, acting.id)?;

    let permitted = filter_delete_groups(&requested, &existing, user_id, &memberships, &ent);
    state.db.remove_memberships(user_id, &permitted)?;

    Ok(StatusCode::NO_CONTENT)
}
