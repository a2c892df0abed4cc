//! Core business logic for inkwell.

pub mod services;
pub mod validation;

pub use services::*;
