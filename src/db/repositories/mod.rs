pub mod admin;
pub mod post;
pub mod project;
