//! Data models for the entities stored in the Boosterdex database.

pub mod pokemon;
pub mod user;
