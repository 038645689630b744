use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS items (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            price       INTEGER NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            sold_out    INTEGER NOT NULL DEFAULT 0,
            image_url   TEXT,
            like_count  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            item_id     TEXT NOT NULL REFERENCES items(id),
            sender_id   TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_item
            ON messages(item_id, created_at);

        CREATE TABLE IF NOT EXISTS likes (
            user_id     TEXT NOT NULL REFERENCES users(id),
            item_id     TEXT NOT NULL REFERENCES items(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, item_id)
        );

        CREATE INDEX IF NOT EXISTS idx_likes_user
            ON likes(user_id);
        ",
    )?;

    // Databases created before these columns existed pick them up here.
    // ALTER TABLE has no IF NOT EXISTS; the duplicate-column error on
    // up-to-date schemas is expected and ignored.
    for stmt in [
        "ALTER TABLE items ADD COLUMN image_url TEXT",
        "ALTER TABLE items ADD COLUMN like_count INTEGER NOT NULL DEFAULT 0",
    ] {
        let _ = conn.execute(stmt, []);
    }

    info!("Database migrations complete");
    Ok(())
}
