//! # PhoneAuth API
//!
//! actix-web surface for the phone OTP service: routes, cookie transport,
//! the session guard, rate limiting and error mapping.

pub mod app;
pub mod config;
pub mod cookies;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use app::create_app;
pub use config::AppState;
