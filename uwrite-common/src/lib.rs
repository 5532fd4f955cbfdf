//! # Uwrite Common Library
//!
//! Shared code for the content-review services:
//! - Error and result types
//! - Configuration loading (TOML files, root folder resolution)

pub mod config;
pub mod error;

pub use error::{Error, Result};
