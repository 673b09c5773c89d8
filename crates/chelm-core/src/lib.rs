//! Test value generation for charts that reference container images.
//!
//! This crate ties the schema types together into the values pipeline: the
//! `TestResolver` rewrites image reference markers to fixed test references,
//! the `Merger` layers configuration maps with override precedence, and the
//! `Generator` looks up a test case and runs both stages to produce the final
//! values map.

pub mod config;
pub mod constants;
pub mod merge;
pub mod resolver;
pub mod values;

pub use config::{ChelmConfig, ConfigError, REGISTRY_ENV};
pub use constants::{
    TestConstants, DEFAULT_TEST_REGISTRY, DEFAULT_TEST_REPOSITORY, DEFAULT_TEST_TAG,
};
pub use merge::{merge_layers, ConflictPolicy, MergeError, Merger};
pub use resolver::{resolve_reference, TestResolver};
pub use values::{generate_values, Generator};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("test case '{0}' not found")]
    CaseNotFound(String),
    #[error("invalid marker base: {0}")]
    Registry(#[from] chelm_schema::ReferenceError),
    #[error("generating image values: {0}")]
    ImageValues(#[from] chelm_schema::ImageError),
    #[error("merging values: {0}")]
    Merge(#[from] MergeError),
    #[error("metadata error: {0}")]
    Meta(#[from] chelm_schema::MetaError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Name of the pipeline stage the error came from.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::CaseNotFound(_) => "case lookup",
            Self::Registry(_) => "registry",
            Self::ImageValues(_) => "image values",
            Self::Merge(_) => "merge",
            Self::Meta(_) => "metadata",
            Self::Config(_) => "config",
        }
    }
}
