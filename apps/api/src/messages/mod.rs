//! Contact form submissions.

pub mod handlers;
pub mod store;
