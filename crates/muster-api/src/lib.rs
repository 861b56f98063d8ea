pub mod auth;
pub mod credential;
pub mod events;
pub mod markdown;
pub mod missions;
pub mod posts;
pub mod routes;
pub mod session;
pub mod tasks;
pub mod users;

use muster_types::error::ApiError;

/// Path identifiers are positive integers; anything else is a client
/// error reported before the repository is ever consulted.
pub fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request(format!("{what} ID must be a positive integer")))
}
