/// Database row types — these map directly to SQLite rows.
/// Distinct from muster-types API models so the wire layer can never
/// leak storage-only fields like the password hash by accident.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct GroupRow {
    pub id: i64,
    pub name: String,
}

pub struct MissionRow {
    pub id: i64,
    pub title: String,
    pub markdown: String,
    pub description: String,
    pub author_id: i64,
}

pub struct TaskRow {
    pub id: i64,
    pub mission_id: i64,
    pub title: String,
    pub markdown: String,
    pub description: String,
    pub done: bool,
}

pub struct EventRow {
    pub id: i64,
    pub name: String,
    pub markdown: String,
    pub description: String,
    pub max_registered: i64,
    pub start_date: String,
    pub end_date: String,
}

pub struct PostRow {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub markdown: String,
    pub published: bool,
}
