//! SeaORM entities, one per table. Ids are stored as UUIDs, timestamps as UTC.

pub mod comment;
pub mod content_item;
pub mod like;
pub mod registration;
pub mod user;
