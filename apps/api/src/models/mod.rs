pub mod admin;
pub mod content;
pub mod cv;
pub mod feedback;
pub mod message;
pub mod project;
