//! Environment errors.

use thiserror::Error;

/// Contract violations of sources and environments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("key `{key}` already exists in source `{source_name}`")]
    DuplicateKey { source_name: String, key: String },

    #[error("match entry `{name}` already exists in source `{source_name}`")]
    DuplicateMatch { source_name: String, name: String },

    #[error("identifier `{identifier}` matches several entries in source `{source_name}`: {}", entries.join(", "))]
    DuplicateMatches {
        source_name: String,
        identifier: String,
        entries: Vec<String>,
    },

    #[error("proxy cycle: {}", chain.join(" -> "))]
    ProxyCycle { chain: Vec<String> },
}
