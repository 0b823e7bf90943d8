//! CV upload-and-replace. Only the most recent upload is retained.

pub mod handlers;
pub mod store;
