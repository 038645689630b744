use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const MAX_NAME_LEN: usize = 50;

/// Field-presence failures raised by the model constructors.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("name must be at most {MAX_NAME_LEN} characters")]
    NameTooLong,
    #[error("price must not be negative")]
    NegativePrice,
}

/// Public user view. The password hash never leaves the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl User {
    /// Builds a new user with a time-orderable id (UUIDv7).
    pub fn new(name: &str, email: &str) -> Result<Self, ModelError> {
        if name.is_empty() {
            return Err(ModelError::Empty("name"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ModelError::NameTooLong);
        }
        if email.is_empty() {
            return Err(ModelError::Empty("email"));
        }

        Ok(Self {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            email: email.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub description: String,
    pub sold_out: bool,
    pub image_url: Option<String>,
    pub like_count: i64,
    pub created_at: String,
}

impl Item {
    /// Builds a new listing. Item ids are random (UUIDv4); only user ids
    /// need to be time-orderable.
    pub fn new(
        name: &str,
        price: i64,
        description: &str,
        image_url: Option<String>,
    ) -> Result<Self, ModelError> {
        if name.is_empty() {
            return Err(ModelError::Empty("name"));
        }
        if price < 0 {
            return Err(ModelError::NegativePrice);
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price,
            description: description.to_string(),
            sold_out: false,
            image_url,
            like_count: 0,
            created_at: format_timestamp(Utc::now()),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub item_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: String,
}

impl Message {
    pub fn new(item_id: &str, sender_id: &str, content: &str) -> Result<Self, ModelError> {
        if item_id.is_empty() {
            return Err(ModelError::Empty("item_id"));
        }
        if sender_id.is_empty() {
            return Err(ModelError::Empty("sender_id"));
        }
        if content.is_empty() {
            return Err(ModelError::Empty("content"));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            created_at: format_timestamp(Utc::now()),
        })
    }
}

/// Fixed-width UTC timestamp. String order equals chronological order,
/// which the message listing relies on.
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}
