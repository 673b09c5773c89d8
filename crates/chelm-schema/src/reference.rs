use crate::digest::TestDigest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("invalid registry '{registry}': {reason}")]
    InvalidRegistry { registry: String, reason: String },
}

impl ReferenceError {
    fn registry(registry: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRegistry {
            registry: registry.to_owned(),
            reason: reason.into(),
        }
    }
}

/// A validated registry host, optionally with a port (`host[:port]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Registry {
    host: String,
    port: Option<u16>,
}

impl Registry {
    /// Parse and validate a registry specification.
    ///
    /// Accepts DNS names (`cgr.test`, `localhost`), IPv4 addresses and
    /// bracketed IPv6 addresses, each with an optional numeric port. Schemes,
    /// paths, credentials and whitespace are rejected.
    ///
    /// This is stricter than Docker-style registry parsing: empty input is an
    /// error instead of falling back to a default registry, and host labels
    /// may not contain `_`.
    pub fn parse(input: &str) -> Result<Self, ReferenceError> {
        if input.is_empty() {
            return Err(ReferenceError::registry(input, "registry must not be empty"));
        }
        if input.contains("://") {
            return Err(ReferenceError::registry(
                input,
                "registry must not include a scheme",
            ));
        }
        if let Some(c) = input
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '/' | '@' | '?' | '#'))
        {
            return Err(ReferenceError::registry(
                input,
                format!("unexpected character '{c}'"),
            ));
        }

        let (host, port) = split_port(input)?;
        validate_host(input, host)?;

        Ok(Self {
            host: host.to_owned(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Registry component as it appears in a reference (`host[:port]`).
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Build a repository under this registry by joining `parts` with `/`.
    pub fn repo(&self, parts: &[&str]) -> Repository {
        let path = parts
            .iter()
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Repository {
            registry: self.clone(),
            path,
        }
    }
}

fn split_port(input: &str) -> Result<(&str, Option<u16>), ReferenceError> {
    if let Some(rest) = input.strip_prefix('[') {
        let Some((addr, tail)) = rest.split_once(']') else {
            return Err(ReferenceError::registry(input, "unterminated IPv6 address"));
        };
        if addr.is_empty() || !addr.chars().all(|c| c.is_ascii_hexdigit() || c == ':') {
            return Err(ReferenceError::registry(input, "invalid IPv6 address"));
        }
        let port = match tail {
            "" => None,
            _ => match tail.strip_prefix(':') {
                Some(p) => Some(parse_port(input, p)?),
                None => return Err(ReferenceError::registry(input, "invalid port separator")),
            },
        };
        // Keep the brackets so the host can be re-joined with a port.
        return Ok((&input[..addr.len() + 2], port));
    }

    match input.rsplit_once(':') {
        Some((host, port)) => Ok((host, Some(parse_port(input, port)?))),
        None => Ok((input, None)),
    }
}

fn parse_port(input: &str, port: &str) -> Result<u16, ReferenceError> {
    if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
        return Err(ReferenceError::registry(
            input,
            format!("invalid port '{port}'"),
        ));
    }
    port.parse::<u16>()
        .map_err(|_| ReferenceError::registry(input, format!("port '{port}' out of range")))
}

fn validate_host(input: &str, host: &str) -> Result<(), ReferenceError> {
    if host.starts_with('[') {
        return Ok(());
    }
    if host.is_empty() {
        return Err(ReferenceError::registry(input, "missing host"));
    }
    for label in host.split('.') {
        if label.is_empty() {
            return Err(ReferenceError::registry(input, "empty host label"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(ReferenceError::registry(
                input,
                format!("host label '{label}' must not start or end with '-'"),
            ));
        }
        if let Some(c) = label
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
        {
            return Err(ReferenceError::registry(
                input,
                format!("invalid character '{c}' in host"),
            ));
        }
    }
    Ok(())
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

impl FromStr for Registry {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Registry {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Registry> for String {
    fn from(value: Registry) -> Self {
        value.to_string()
    }
}

/// A repository within a [`Registry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    registry: Registry,
    path: String,
}

impl Repository {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registry component (`host[:port]`).
    pub fn registry_str(&self) -> String {
        self.registry.name()
    }

    /// Repository path without the registry host.
    pub fn repository_str(&self) -> &str {
        &self.path
    }

    /// Fully qualified `host/path` name.
    pub fn name(&self) -> String {
        format!("{}/{}", self.registry, self.path)
    }

    /// Full reference pinned to `digest` (`host/path@sha256:...`).
    pub fn digest(&self, digest: &TestDigest) -> String {
        format!("{}@{digest}", self.name())
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.path)
    }
}
