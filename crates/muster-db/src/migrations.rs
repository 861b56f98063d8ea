use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS groups (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL UNIQUE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Membership edges are a set: the pair is the primary key, so
        -- re-adding an edge is a no-op and removal is idempotent.
        CREATE TABLE IF NOT EXISTS memberships (
            user_id     INTEGER NOT NULL REFERENCES users(id),
            group_id    INTEGER NOT NULL REFERENCES groups(id),
            is_admin    INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, group_id)
        );

        CREATE INDEX IF NOT EXISTS idx_memberships_group
            ON memberships(group_id);

        CREATE TABLE IF NOT EXISTS missions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            markdown    TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            author_id   INTEGER NOT NULL REFERENCES users(id)
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            mission_id  INTEGER NOT NULL REFERENCES missions(id),
            title       TEXT NOT NULL,
            markdown    TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            done        INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_mission
            ON tasks(mission_id);

        CREATE TABLE IF NOT EXISTS events (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            markdown        TEXT NOT NULL DEFAULT '',
            description     TEXT NOT NULL DEFAULT '',
            max_registered  INTEGER NOT NULL DEFAULT 0,
            start_date      TEXT NOT NULL DEFAULT '',
            end_date        TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS posts (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id   INTEGER NOT NULL REFERENCES users(id),
            title       TEXT NOT NULL,
            markdown    TEXT NOT NULL DEFAULT '',
            published   INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_posts_author
            ON posts(author_id);

        -- Seed the root admin group; administering it grants elevation
        INSERT OR IGNORE INTO groups (id, name) VALUES (1, 'admin');
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
