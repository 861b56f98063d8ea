use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use muster_types::api::PostResponse;
use muster_types::error::ApiError;

use crate::auth::AppState;
use crate::parse_id;

#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    /// `?published=true` narrows to published posts, `false` to drafts;
    /// anything else (or nothing) returns all of the author's posts.
    pub published: Option<String>,
}

impl PostsQuery {
    fn filter(&self) -> Option<bool> {
        match self.published.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }
}

/// `GET /users/{userId}/posts`
pub async fn by_author(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<PostsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id(&user_id, "user")?;

    let posts: Vec<PostResponse> = state
        .db
        .posts_by_author(user_id, query.filter())?
        .into_iter()
        .map(|p| PostResponse {
            id: p.id,
            author_id: p.author_id,
            title: p.title,
            markdown: p.markdown,
            published: p.published,
        })
        .collect();

    Ok(Json(posts))
}
