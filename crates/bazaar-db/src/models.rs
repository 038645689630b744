/// Database row types — these map directly to SQLite rows.
/// Distinct from bazaar-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct ItemRow {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub description: String,
    pub sold_out: bool,
    pub image_url: Option<String>,
    pub like_count: i64,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub item_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: String,
}
