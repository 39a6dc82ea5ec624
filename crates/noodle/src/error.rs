//! # Engine Error Types
//!
//! Errors raised while turning a game description into a running game.
//! Errors raised while a game runs are [`StoreError`]s.

use std::path::PathBuf;

use noodle_core::StoreError;
use thiserror::Error;

/// Errors that can occur while loading a game.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The game description could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The game description is not valid TOML or does not match the schema.
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying parse error.
        source: toml::de::Error,
    },

    /// The description parsed but makes no sense (unknown names, zero buckets...).
    #[error("invalid game description: {0}")]
    Invalid(String),

    /// Populating the stores failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for loading.
pub type LoadResult<T> = Result<T, LoadError>;
