pub mod auth_service;
pub mod auth_service_impl;
pub mod lockout;
pub mod password;

pub use auth_service::{AdminIdentity, AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;
pub use lockout::LockoutState;
