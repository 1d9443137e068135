//! Token service module for JWT management
//!
//! This module handles all token-related operations including:
//! - Access and refresh token issuance with independent secrets
//! - Verification that distinguishes expiry from every other failure
//! - Digesting refresh tokens for storage in the user record

mod config;
mod service;


pub use config::TokenConfig;
pub use service::{refresh_token_digest, TokenService};
