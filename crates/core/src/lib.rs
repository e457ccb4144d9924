//! Core business logic for metagram.

pub mod services;

pub use services::*;
