use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use muster_policy::filter_update_task;
use muster_types::api::{TaskPatch, TaskResponse};
use muster_types::error::ApiError;

use crate::auth::AppState;
use crate::markdown::derive_description;
use crate::session::{Session, entitlements, require_user};
use crate::parse_id;

/// `PATCH /missions/{missionId}/tasks/{taskId}` — fine-filtered: the
/// policy layer strips fields outside the caller's write scope and the
/// remainder is applied, even when that remainder is empty.
pub async fn update(
    State(state): State<AppState>,
    Path((mission_id, task_id)): Path<(String, String)>,
    session: Session,
    Json(patch): Json<TaskPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let mission_id = parse_id(&mission_id, "mission")?;
    let task_id = parse_id(&task_id, "task")?;

    let acting = require_user(&state, &session)?;

    if state.db.get_mission(mission_id)?.is_none() {
        return Err(ApiError::not_found(format!("no mission with id {mission_id}")));
    }

    let task = state
        .db
        .get_task(task_id)?
        .filter(|t| t.mission_id == mission_id)
        .ok_or_else(|| {
            ApiError::not_found(format!("no task with id {task_id} in mission {mission_id}"))
        })?;

    let ent = entitlements(&state, acting.id)?;
    let sanitized = filter_update_task(patch, &ent);

    // An empty sanitized patch persists as a no-op, not an error
    let description = sanitized.markdown.as_deref().map(derive_description);
    state.db.update_task(
        task.id,
        sanitized.title.as_deref(),
        sanitized.markdown.as_deref(),
        description.as_deref(),
        sanitized.done,
    )?;

    let task = state
        .db
        .get_task(task.id)?
        .ok_or_else(|| anyhow::anyhow!("task {task_id} vanished during update"))?;

    Ok(Json(TaskResponse {
        id: task.id,
        mission_id: task.mission_id,
        title: task.title,
        markdown: task.markdown,
        description: task.description,
        done: task.done,
    }))
}
