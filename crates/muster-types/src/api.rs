use serde::{Deserialize, Serialize};

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `GET /check` — the public identity bound to the session.
/// The credential hash is never serialized anywhere.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub id: i64,
    pub username: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailResponse {
    pub id: i64,
    pub username: String,
    pub created_at: String,
    pub groups: Vec<GroupResponse>,
}

/// Partial update — absent fields are left untouched, never cleared.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    pub username: Option<String>,
    pub password: Option<String>,
}

// -- Groups --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupResponse {
    pub id: i64,
    pub name: String,
}

/// Membership mutation body: `{"groupsId": [1, 2]}`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupIdsRequest {
    #[serde(rename = "groupsId")]
    pub groups_id: Vec<i64>,
}

// -- Missions --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MissionPatch {
    pub title: Option<String>,
    pub markdown: Option<String>,
    /// Derived from `markdown` server-side; a client setting it is a 400.
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionResponse {
    pub id: i64,
    pub title: String,
    pub markdown: String,
    pub description: String,
    pub author_id: i64,
}

// -- Tasks --

/// Task field patch as sent by the client. The policy layer strips any
/// field outside the caller's write scope before it reaches storage.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub markdown: Option<String>,
    pub description: Option<String>,
    pub done: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.markdown.is_none()
            && self.description.is_none()
            && self.done.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: i64,
    pub mission_id: i64,
    pub title: String,
    pub markdown: String,
    pub description: String,
    pub done: bool,
}

// -- Events --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct EventPatch {
    pub name: Option<String>,
    pub markdown: Option<String>,
    pub max_registered: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: i64,
    pub name: String,
    pub markdown: String,
    pub description: String,
    pub max_registered: i64,
    pub start_date: String,
    pub end_date: String,
}

// -- Posts --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub markdown: String,
    pub published: bool,
}
