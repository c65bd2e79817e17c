//! Core module - shared infrastructure for deepbrowse
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{BrowseError, Result};
pub use types::*;
