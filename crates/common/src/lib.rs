//! Common utilities and shared types for metagram.
//!
//! This crate provides foundational components used across all metagram crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based entity identifiers via [`IdGenerator`]
//! - **Storage**: Blob store abstraction with a local-filesystem backend
//!
//! # Example
//!
//! ```no_run
//! use metagram_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{
    LocalStorage, NoOpStorage, StorageBackend, StorageService, UploadedFile, generate_upload_name,
};
