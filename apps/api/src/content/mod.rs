//! Singleton page sections: Hero, About, Services, Education.
//!
//! Each table holds at most one row (enforced by a `singleton` boolean key),
//! so every write is an upsert and reads fall back to an empty default.

pub mod handlers;
pub mod store;
