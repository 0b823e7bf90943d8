//! Dashboard-only endpoints: admin accounts and summary counts.

pub mod handlers;
