//! Domain models for the session API.

pub mod user;

pub use user::Credential;
