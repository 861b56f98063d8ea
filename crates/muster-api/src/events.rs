use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use muster_policy::allows_update;
use muster_types::api::{EventPatch, EventResponse};
use muster_types::error::ApiError;

use crate::auth::AppState;
use crate::markdown::derive_description;
use crate::session::{Session, entitlements, require_user};
use crate::parse_id;

/// `PATCH /events/{eventId}` — body validated explicitly so unknown or
/// ill-typed fields come back as a 400, then coarse-gated like missions.
pub async fn update(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    session: Session,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let event_id = parse_id(&event_id, "event")?;

    let patch: EventPatch = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("invalid event patch: {e}")))?;

    let acting = require_user(&state, &session)?;

    if state.db.get_event(event_id)?.is_none() {
        return Err(ApiError::not_found(format!("no event with id {event_id}")));
    }

    let ent = entitlements(&state, acting.id)?;
    if !allows_update(&ent) {
        return Err(ApiError::Unauthorized);
    }

    let description = patch.markdown.as_deref().map(derive_description);
    state.db.update_event(
        event_id,
        patch.name.as_deref(),
        patch.markdown.as_deref(),
        description.as_deref(),
        patch.max_registered,
        patch.start_date.as_deref(),
        patch.end_date.as_deref(),
    )?;

    let event = state
        .db
        .get_event(event_id)?
        .ok_or_else(|| anyhow::anyhow!("event {event_id} vanished during update"))?;

    Ok(Json(EventResponse {
        id: event.id,
        name: event.name,
        markdown: event.markdown,
        description: event.description,
        max_registered: event.max_registered,
        start_date: event.start_date,
        end_date: event.end_date,
    }))
}
