pub mod assist;
pub mod auth;
pub mod error;
pub mod items;
pub mod likes;
pub mod messages;
pub mod users;
