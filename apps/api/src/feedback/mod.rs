//! Visitor feedback. Submissions stay hidden until an admin approves them.

pub mod handlers;
pub mod store;
