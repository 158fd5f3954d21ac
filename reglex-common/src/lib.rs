//! # RegLex Common Library
//!
//! Shared code for RegLex services:
//! - Common error type
//! - TOML configuration model and file handling

pub mod config;
pub mod error;

pub use error::{Error, Result};
