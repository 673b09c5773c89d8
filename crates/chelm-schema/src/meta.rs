use crate::images::ImageMapping;
use crate::types::{CaseName, Values};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("failed to read chart metadata: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse chart metadata: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("failed to parse chart metadata: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("unsupported chart metadata format '{0}', expected .toml or .json")]
    UnsupportedFormat(String),
    #[error("test case name must not be empty")]
    EmptyCaseName,
    #[error("duplicate test case name '{0}'")]
    DuplicateCase(String),
}

/// Serialization format of a metadata or values file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, MetaError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            other => Err(MetaError::UnsupportedFormat(
                other.unwrap_or_default().to_owned(),
            )),
        }
    }
}

/// Chart metadata: the declared images plus the test suite definition.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChartMeta {
    #[serde(default)]
    pub images: ImageMapping,
    #[serde(default)]
    pub test: TestSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TestSection {
    /// Values applied to every test case.
    #[serde(default)]
    pub values: Values,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    pub name: CaseName,
    #[serde(default)]
    pub values: Values,
}

impl ChartMeta {
    /// Find a test case by exact name.
    pub fn case(&self, name: &str) -> Option<&TestCase> {
        self.test.cases.iter().find(|c| c.name == name)
    }

    /// Test case names in declaration order.
    pub fn case_names(&self) -> Vec<&str> {
        self.test.cases.iter().map(|c| c.name.as_str()).collect()
    }

    /// Reject empty and duplicate case names.
    pub fn validate(&self) -> Result<(), MetaError> {
        let mut seen = BTreeSet::new();
        for case in &self.test.cases {
            if case.name.trim().is_empty() {
                return Err(MetaError::EmptyCaseName);
            }
            if !seen.insert(case.name.as_str()) {
                return Err(MetaError::DuplicateCase(case.name.to_string()));
            }
        }
        Ok(())
    }
}

pub fn parse_meta_str(input: &str, format: Format) -> Result<ChartMeta, MetaError> {
    let meta: ChartMeta = match format {
        Format::Toml => toml::from_str(input)?,
        Format::Json => serde_json::from_str(input)?,
    };
    meta.validate()?;
    Ok(meta)
}

pub fn parse_meta_file(path: impl AsRef<Path>) -> Result<ChartMeta, MetaError> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let content = fs::read_to_string(path)?;
    parse_meta_str(&content, format)
}

/// Read a plain values file (TOML or JSON, by extension) into a layer.
pub fn parse_values_file(path: impl AsRef<Path>) -> Result<Values, MetaError> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let content = fs::read_to_string(path)?;
    Ok(match format {
        Format::Toml => toml::from_str(&content)?,
        Format::Json => serde_json::from_str(&content)?,
    })
}
