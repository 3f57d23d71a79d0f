//! Common types and utilities shared across modules

pub mod channels;
pub mod errors;
pub mod traits;
pub mod types;
