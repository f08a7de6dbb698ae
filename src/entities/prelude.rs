pub use super::admin::Entity as Admin;
pub use super::posts::Entity as Posts;
pub use super::projects::Entity as Projects;
