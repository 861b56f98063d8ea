use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use muster_policy::allows_update;
use muster_types::api::{MissionPatch, MissionResponse};
use muster_types::error::ApiError;

use crate::auth::AppState;
use crate::markdown::derive_description;
use crate::session::{Session, entitlements, require_user};
use crate::parse_id;

/// `PATCH /missions/{missionId}` — coarse-gated: the whole mutation is
/// allowed or denied, no field-level filtering.
pub async fn update(
    State(state): State<AppState>,
    Path(mission_id): Path<String>,
    session: Session,
    Json(patch): Json<MissionPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let mission_id = parse_id(&mission_id, "mission")?;

    if patch.description.is_some() {
        return Err(ApiError::bad_request(
            "description is computed from markdown and cannot be set",
        ));
    }

    let acting = require_user(&state, &session)?;

    if state.db.get_mission(mission_id)?.is_none() {
        return Err(ApiError::not_found(format!("no mission with id {mission_id}")));
    }

    let ent = entitlements(&state, acting.id)?;
    if !allows_update(&ent) {
        return Err(ApiError::Unauthorized);
    }

    let description = patch.markdown.as_deref().map(derive_description);
    state.db.update_mission(
        mission_id,
        patch.title.as_deref(),
        patch.markdown.as_deref(),
        description.as_deref(),
    )?;

    let mission = state
        .db
        .get_mission(mission_id)?
        .ok_or_else(|| anyhow::anyhow!("mission {mission_id} vanished during update"))?;

    Ok(Json(MissionResponse {
        id: mission.id,
        title: mission.title,
        markdown: mission.markdown,
        description: mission.description,
        author_id: mission.author_id,
    }))
}
