//! # CMM Common Library
//!
//! Shared code for the classical music catalog:
//! - Error type used by storage-level code
//! - Configuration loading and root folder resolution
//! - Database initialization (schema creation)
//! - Media file store (audio files, cover images)

pub mod config;
pub mod db;
pub mod error;
pub mod media;

pub use error::{Error, Result};
pub use media::MediaStore;
