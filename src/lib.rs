//! Mint Scanner Library
//!
//! Detects newly initialized SPL token mints and scores them on creator
//! activity, holder concentration and narrative keywords.

pub mod analysis;
pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod notify;
pub mod scanner;
pub mod stats;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
