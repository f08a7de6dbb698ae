pub mod prelude;

pub mod admin;
pub mod posts;
pub mod projects;
