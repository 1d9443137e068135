//! Repository interfaces for the user store and the in-memory implementation.

pub mod user;

pub use user::{InMemoryUserRepository, UserRepository};
