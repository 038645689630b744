use crate::Database;
use crate::models::{ItemRow, MessageRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, name: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, password) VALUES (?1, ?2, ?3, ?4)",
                (id, name, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, email, password, created_at FROM users WHERE email = ?1",
                    [email],
                    map_user_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Exact name match, not substring. Zero matches is an empty vec.
    pub fn find_users_by_name(&self, name: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, password, created_at FROM users WHERE name = ?1",
            )?;
            let rows = stmt
                .query_map([name], map_user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Items --

    pub fn insert_item(
        &self,
        id: &str,
        name: &str,
        price: i64,
        description: &str,
        image_url: Option<&str>,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO items (id, name, price, description, sold_out, image_url, like_count, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, 0, ?6)",
                rusqlite::params![id, name, price, description, image_url, created_at],
            )?;
            Ok(())
        })
    }

    pub fn list_items(&self) -> Result<Vec<ItemRow>> {
        self.with_conn(|conn| query_items(conn, None))
    }

    pub fn search_items(&self, keyword: &str) -> Result<Vec<ItemRow>> {
        self.with_conn(|conn| query_items(conn, Some(keyword)))
    }

    /// Flips sold_out on. Returns false when no row matched, so the caller
    /// can distinguish a missing item from a repeat purchase.
    pub fn purchase_item(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute("UPDATE items SET sold_out = 1 WHERE id = ?1", [id])?;
            Ok(updated > 0)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        item_id: &str,
        sender_id: &str,
        content: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, item_id, sender_id, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, item_id, sender_id, content, created_at),
            )?;
            Ok(())
        })
    }

    pub fn get_messages(&self, item_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, item_id, sender_id, content, created_at
                 FROM messages
                 WHERE item_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt
                .query_map([item_id], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        item_id: row.get(1)?,
                        sender_id: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Likes --

    /// Toggle a like: removes the (user, item) row if it exists, inserts it
    /// if not. Returns true when the like was added.
    ///
    /// Check, mutation and counter maintenance run in one transaction, and
    /// like_count is recomputed from the likes relation rather than
    /// incremented, so the denormalized count cannot drift from the rows.
    pub fn toggle_like(&self, user_id: &str, item_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND item_id = ?2)",
                (user_id, item_id),
                |row| row.get(0),
            )?;

            if exists {
                tx.execute(
                    "DELETE FROM likes WHERE user_id = ?1 AND item_id = ?2",
                    (user_id, item_id),
                )?;
            } else {
                tx.execute(
                    "INSERT INTO likes (user_id, item_id) VALUES (?1, ?2)",
                    (user_id, item_id),
                )?;
            }

            tx.execute(
                "UPDATE items SET like_count = (SELECT COUNT(*) FROM likes WHERE item_id = ?1)
                 WHERE id = ?1",
                [item_id],
            )?;

            tx.commit()?;
            Ok(!exists)
        })
    }

    pub fn get_liked_item_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT item_id FROM likes WHERE user_id = ?1 ORDER BY created_at ASC",
            )?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        description: row.get(3)?,
        sold_out: row.get(4)?,
        image_url: row.get(5)?,
        like_count: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Newest listings first; id breaks ties within the same second so the
/// order is stable for a given dataset.
fn query_items(conn: &Connection, keyword: Option<&str>) -> Result<Vec<ItemRow>> {
    const COLUMNS: &str = "id, name, price, description, sold_out, image_url, like_count, created_at";

    let rows = match keyword {
        Some(kw) => {
            let pattern = format!("%{}%", kw);
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM items WHERE name LIKE ?1 ORDER BY created_at DESC, id DESC"
            ))?;
            stmt.query_map([pattern], map_item_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM items ORDER BY created_at DESC, id DESC"
            ))?;
            stmt.query_map([], map_item_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use crate::Database;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database, id: &str, name: &str) {
        db.create_user(id, name, &format!("{id}@example.com"), "hash")
            .unwrap();
    }

    fn seed_item(db: &Database, id: &str, name: &str, created_at: &str) {
        db.insert_item(id, name, 1000, "", None, created_at).unwrap();
    }

    fn like_count(db: &Database, item_id: &str) -> i64 {
        db.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT like_count FROM items WHERE id = ?1",
                [item_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
        .unwrap()
    }

    fn relation_count(db: &Database, item_id: &str) -> i64 {
        db.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM likes WHERE item_id = ?1",
                [item_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
        .unwrap()
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = db();
        db.create_user("u1", "Taro", "taro@x.com", "hash").unwrap();
        assert!(db.create_user("u2", "Other", "taro@x.com", "hash").is_err());
    }

    #[test]
    fn user_lookup_by_email_and_name() {
        let db = db();
        db.create_user("u1", "Taro", "taro@x.com", "hash").unwrap();

        let found = db.get_user_by_email("taro@x.com").unwrap().unwrap();
        assert_eq!(found.id, "u1");
        assert!(db.get_user_by_email("nobody@x.com").unwrap().is_none());

        assert_eq!(db.find_users_by_name("Taro").unwrap().len(), 1);
        // Exact match only
        assert!(db.find_users_by_name("Tar").unwrap().is_empty());
    }

    #[test]
    fn items_list_newest_first() {
        let db = db();
        seed_item(&db, "i1", "Chair", "2024-01-01 00:00:00");
        seed_item(&db, "i2", "Desk", "2024-01-02 00:00:00");

        let items = db.list_items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "i2");
        assert!(!items[0].sold_out);
        assert_eq!(items[0].like_count, 0);
    }

    #[test]
    fn search_matches_substring() {
        let db = db();
        seed_item(&db, "i1", "Office Chair", "2024-01-01 00:00:00");
        seed_item(&db, "i2", "Desk", "2024-01-01 00:00:00");

        let hits = db.search_items("Chair").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "i1");
        assert!(db.search_items("lamp").unwrap().is_empty());
    }

    #[test]
    fn purchase_is_idempotent() {
        let db = db();
        seed_item(&db, "i1", "Chair", "2024-01-01 00:00:00");

        assert!(db.purchase_item("i1").unwrap());
        assert!(db.purchase_item("i1").unwrap());

        let items = db.list_items().unwrap();
        assert!(items[0].sold_out);
    }

    #[test]
    fn purchase_missing_item_matches_no_rows() {
        let db = db();
        assert!(!db.purchase_item("no-such-id").unwrap());
    }

    #[test]
    fn messages_come_back_in_chronological_order() {
        let db = db();
        seed_user(&db, "u1", "Taro");
        seed_item(&db, "i1", "Chair", "2024-01-01 00:00:00");

        // Inserted out of order on purpose
        db.insert_message("m2", "i1", "u1", "second", "2024-01-01 10:00:01")
            .unwrap();
        db.insert_message("m1", "i1", "u1", "first", "2024-01-01 10:00:00")
            .unwrap();

        let msgs = db.get_messages("i1").unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].content, "first");
        assert_eq!(msgs[1].content, "second");
    }

    #[test]
    fn toggle_like_is_an_involution() {
        let db = db();
        seed_user(&db, "u1", "Taro");
        seed_item(&db, "i1", "Chair", "2024-01-01 00:00:00");

        assert!(db.toggle_like("u1", "i1").unwrap());
        assert_eq!(db.get_liked_item_ids("u1").unwrap(), vec!["i1"]);
        assert_eq!(like_count(&db, "i1"), 1);

        assert!(!db.toggle_like("u1", "i1").unwrap());
        assert!(db.get_liked_item_ids("u1").unwrap().is_empty());
        assert_eq!(like_count(&db, "i1"), 0);
        assert_eq!(relation_count(&db, "i1"), 0);
    }

    #[test]
    fn like_count_always_matches_the_relation() {
        let db = db();
        seed_item(&db, "i1", "Chair", "2024-01-01 00:00:00");
        for u in ["u1", "u2", "u3"] {
            seed_user(&db, u, u);
            db.toggle_like(u, "i1").unwrap();
        }

        assert_eq!(like_count(&db, "i1"), 3);
        assert_eq!(like_count(&db, "i1"), relation_count(&db, "i1"));

        db.toggle_like("u2", "i1").unwrap();
        assert_eq!(like_count(&db, "i1"), 2);
        assert_eq!(like_count(&db, "i1"), relation_count(&db, "i1"));
    }

    #[test]
    fn empty_listings_are_empty_not_errors() {
        let db = db();
        assert!(db.list_items().unwrap().is_empty());
        assert!(db.get_messages("nope").unwrap().is_empty());
        assert!(db.get_liked_item_ids("nope").unwrap().is_empty());
        assert!(db.find_users_by_name("nope").unwrap().is_empty());
    }
}
