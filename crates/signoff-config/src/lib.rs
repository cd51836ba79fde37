// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for the signoff engine.
//!
//! This crate provides [`SignoffConfig`] — the top-level configuration — the
//! resource-map grammar ([`parse_resource_map`]), and scoped settings
//! resolution ([`ScopedSettings`], [`ScopeOverlays`]).
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod loader;
mod resource_map;
mod settings;

pub use loader::{ConfigWarning, SignoffConfig, load_config, merge_configs, parse_toml, validate_config};
pub use resource_map::{ResourceEndpoint, ResourceEntry, parse_resource_map};
pub use settings::{AutographSettings, EcdsaSettings, ScopeOverlays, ScopedSettings, resolve};

/// Errors that can occur while loading, parsing, or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// The `resources` grammar was malformed or violated a uniqueness rule.
    #[error("invalid resource map on line '{line}': {message}")]
    InvalidResourceMap {
        /// The offending line, verbatim.
        line: String,
        /// Description of the violation.
        message: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}
