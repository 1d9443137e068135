//! Common utility functions

pub mod duration;
pub mod phone;

pub use duration::parse_duration;
pub use phone::*;
