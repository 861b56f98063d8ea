use std::collections::BTreeSet;

use crate::Database;
use crate::models::{EventRow, GroupRow, MissionRow, PostRow, TaskRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                (username, password_hash),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", &[&username]))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", &[&id]))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, username, password, created_at FROM users ORDER BY id")?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Partial update: `None` fields are left untouched.
    pub fn update_user(
        &self,
        id: i64,
        username: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET
                     username = COALESCE(?2, username),
                     password = COALESCE(?3, password)
                 WHERE id = ?1",
                rusqlite::params![id, username, password_hash],
            )?;
            Ok(())
        })
    }

    /// Drops the user's membership edges and authored content before the
    /// row itself, so the foreign keys on posts and missions never fire.
    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM memberships WHERE user_id = ?1", [id])?;
            tx.execute(
                "DELETE FROM tasks WHERE mission_id IN
                     (SELECT id FROM missions WHERE author_id = ?1)",
                [id],
            )?;
            tx.execute("DELETE FROM missions WHERE author_id = ?1", [id])?;
            tx.execute("DELETE FROM posts WHERE author_id = ?1", [id])?;
            tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Groups & memberships --

    pub fn create_group(&self, name: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute("INSERT INTO groups (name) VALUES (?1)", [name])?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn groups_for_user(&self, user_id: i64) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT g.id, g.name
                 FROM groups g
                 JOIN memberships m ON m.group_id = g.id
                 WHERE m.user_id = ?1
                 ORDER BY g.id",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(GroupRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn group_ids_for_user(&self, user_id: i64) -> Result<BTreeSet<i64>> {
        self.with_conn(|conn| {
            query_id_set(
                conn,
                "SELECT group_id FROM memberships WHERE user_id = ?1",
                user_id,
            )
        })
    }

    /// Groups where this user's membership row carries the admin flag.
    pub fn administered_group_ids(&self, user_id: i64) -> Result<BTreeSet<i64>> {
        self.with_conn(|conn| {
            query_id_set(
                conn,
                "SELECT group_id FROM memberships WHERE user_id = ?1 AND is_admin = 1",
                user_id,
            )
        })
    }

    /// Elevated users administer the root `admin` group.
    pub fn is_elevated(&self, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*)
                 FROM memberships m
                 JOIN groups g ON g.id = m.group_id
                 WHERE m.user_id = ?1 AND m.is_admin = 1 AND g.name = 'admin'",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Which of the candidate ids resolve to an existing group.
    pub fn existing_group_ids(&self, candidates: &BTreeSet<i64>) -> Result<BTreeSet<i64>> {
        if candidates.is_empty() {
            return Ok(BTreeSet::new());
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=candidates.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id FROM groups WHERE id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = candidates
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let ids = stmt
                .query_map(params.as_slice(), |row| row.get::<_, i64>(0))?
                .collect::<std::result::Result<BTreeSet<_>, _>>()?;
            Ok(ids)
        })
    }

    pub fn add_membership(&self, user_id: i64, group_id: i64, is_admin: bool) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO memberships (user_id, group_id, is_admin)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, group_id, is_admin],
            )?;
            Ok(())
        })
    }

    /// Set semantics: edges that already exist are left alone.
    pub fn add_memberships(&self, user_id: i64, group_ids: &BTreeSet<i64>) -> Result<()> {
        self.with_conn_mut(|conn| {
            let mut stmt = conn.prepare(
                "INSERT OR IGNORE INTO memberships (user_id, group_id) VALUES (?1, ?2)",
            )?;
            for group_id in group_ids {
                stmt.execute([user_id, *group_id])?;
            }
            Ok(())
        })
    }

    /// Set semantics: removing an absent edge is a no-op.
    pub fn remove_memberships(&self, user_id: i64, group_ids: &BTreeSet<i64>) -> Result<()> {
        self.with_conn_mut(|conn| {
            let mut stmt =
                conn.prepare("DELETE FROM memberships WHERE user_id = ?1 AND group_id = ?2")?;
            for group_id in group_ids {
                stmt.execute([user_id, *group_id])?;
            }
            Ok(())
        })
    }

    // -- Missions --

    pub fn create_mission(
        &self,
        title: &str,
        markdown: &str,
        description: &str,
        author_id: i64,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO missions (title, markdown, description, author_id)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![title, markdown, description, author_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_mission(&self, id: i64) -> Result<Option<MissionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, markdown, description, author_id FROM missions WHERE id = ?1",
            )?;
            stmt.query_row([id], |row| {
                Ok(MissionRow {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    markdown: row.get(2)?,
                    description: row.get(3)?,
                    author_id: row.get(4)?,
                })
            })
            .optional()
        })
    }

    pub fn update_mission(
        &self,
        id: i64,
        title: Option<&str>,
        markdown: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE missions SET
                     title = COALESCE(?2, title),
                     markdown = COALESCE(?3, markdown),
                     description = COALESCE(?4, description)
                 WHERE id = ?1",
                rusqlite::params![id, title, markdown, description],
            )?;
            Ok(())
        })
    }

    // -- Tasks --

    pub fn create_task(
        &self,
        mission_id: i64,
        title: &str,
        markdown: &str,
        description: &str,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO tasks (mission_id, title, markdown, description)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![mission_id, title, markdown, description],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_task(&self, id: i64) -> Result<Option<TaskRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, mission_id, title, markdown, description, done
                 FROM tasks WHERE id = ?1",
            )?;
            stmt.query_row([id], |row| {
                Ok(TaskRow {
                    id: row.get(0)?,
                    mission_id: row.get(1)?,
                    title: row.get(2)?,
                    markdown: row.get(3)?,
                    description: row.get(4)?,
                    done: row.get(5)?,
                })
            })
            .optional()
        })
    }

    pub fn update_task(
        &self,
        id: i64,
        title: Option<&str>,
        markdown: Option<&str>,
        description: Option<&str>,
        done: Option<bool>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE tasks SET
                     title = COALESCE(?2, title),
                     markdown = COALESCE(?3, markdown),
                     description = COALESCE(?4, description),
                     done = COALESCE(?5, done)
                 WHERE id = ?1",
                rusqlite::params![id, title, markdown, description, done],
            )?;
            Ok(())
        })
    }

    // -- Events --

    pub fn create_event(
        &self,
        name: &str,
        markdown: &str,
        description: &str,
        max_registered: i64,
        start_date: &str,
        end_date: &str,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO events (name, markdown, description, max_registered, start_date, end_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![name, markdown, description, max_registered, start_date, end_date],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_event(&self, id: i64) -> Result<Option<EventRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, markdown, description, max_registered, start_date, end_date
                 FROM events WHERE id = ?1",
            )?;
            stmt.query_row([id], |row| {
                Ok(EventRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    markdown: row.get(2)?,
                    description: row.get(3)?,
                    max_registered: row.get(4)?,
                    start_date: row.get(5)?,
                    end_date: row.get(6)?,
                })
            })
            .optional()
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_event(
        &self,
        id: i64,
        name: Option<&str>,
        markdown: Option<&str>,
        description: Option<&str>,
        max_registered: Option<i64>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE events SET
                     name = COALESCE(?2, name),
                     markdown = COALESCE(?3, markdown),
                     description = COALESCE(?4, description),
                     max_registered = COALESCE(?5, max_registered),
                     start_date = COALESCE(?6, start_date),
                     end_date = COALESCE(?7, end_date)
                 WHERE id = ?1",
                rusqlite::params![id, name, markdown, description, max_registered, start_date, end_date],
            )?;
            Ok(())
        })
    }

    // -- Posts --

    pub fn create_post(
        &self,
        author_id: i64,
        title: &str,
        markdown: &str,
        published: bool,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (author_id, title, markdown, published)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![author_id, title, markdown, published],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// All of an author's posts, optionally narrowed to published or drafts.
    pub fn posts_by_author(&self, author_id: i64, published: Option<bool>) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, author_id, title, markdown, published
                 FROM posts
                 WHERE author_id = ?1 AND (?2 IS NULL OR published = ?2)
                 ORDER BY id",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![author_id, published], |row| {
                    Ok(PostRow {
                        id: row.get(0)?,
                        author_id: row.get(1)?,
                        title: row.get(2)?,
                        markdown: row.get(3)?,
                        published: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(
    conn: &Connection,
    predicate: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, password, created_at FROM users WHERE {}",
        predicate
    );
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row(params, user_from_row).optional()
}

fn user_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn query_id_set(conn: &Connection, sql: &str, param: i64) -> Result<BTreeSet<i64>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([param], |row| row.get::<_, i64>(0))?
        .collect::<std::result::Result<BTreeSet<_>, _>>()?;
    Ok(ids)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
