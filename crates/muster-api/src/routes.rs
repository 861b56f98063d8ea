use axum::Router;
use axum::routing::{delete, get, patch, post};

use crate::auth::{self, AppState};
use crate::{events, missions, posts, tasks, users};

/// The full route table. Layering (CORS, tracing) is left to the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/check", get(auth::check))
        .route("/users", get(users::index))
        .route("/users", post(users::store))
        .route("/users/{user_id}", get(users::show))
        .route("/users/{user_id}", patch(users::update))
        .route("/users/{user_id}", delete(users::delete))
        .route("/users/{user_id}/groups", get(users::get_groups))
        .route("/users/{user_id}/groups", post(users::add_groups))
        .route("/users/{user_id}/groups", delete(users::delete_groups))
        .route("/users/{user_id}/posts", get(posts::by_author))
        .route("/missions/{mission_id}", patch(missions::update))
        .route("/missions/{mission_id}/tasks/{task_id}", patch(tasks::update))
        .route("/events/{event_id}", patch(events::update))
        .with_state(state)
}
