//! Substitution of image reference markers with fixed test values.
//!
//! Every field of a resolved reference comes from the test registry, the
//! configured [`TestConstants`], and a [`TestDigest`] of the image identifier.
//! Nothing here touches a real registry.

use crate::constants::TestConstants;
use chelm_schema::{ReferenceError, RefField, Registry, Repository, TestDigest, Token};
use tracing::trace;

/// Resolves tokenized templates for one test registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResolver {
    registry: Registry,
    constants: TestConstants,
}

impl TestResolver {
    pub fn new(registry: Registry, constants: TestConstants) -> Self {
        Self {
            registry,
            constants,
        }
    }

    /// Parse `test_registry` and build a resolver over it.
    pub fn parse(test_registry: &str, constants: TestConstants) -> Result<Self, ReferenceError> {
        Ok(Self::new(Registry::parse(test_registry)?, constants))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn constants(&self) -> &TestConstants {
        &self.constants
    }

    /// Test repository for `image_id`. The identifier is always lower-cased.
    ///
    /// An empty identifier contributes no path segment, so the result is the
    /// bare test repository (`cgr.test/chainguard/test` with the defaults).
    pub fn repository(&self, image_id: &str) -> Repository {
        let name = image_id.to_lowercase();
        self.registry.repo(&[&self.constants.repository, &name])
    }

    /// Concatenate `tokens`, substituting each field marker.
    ///
    /// The digest is computed once, so every digest-derived field for one
    /// image agrees.
    pub fn resolve(&self, image_id: &str, tokens: &[Token]) -> String {
        let repo = self.repository(image_id);
        let digest = TestDigest::of(image_id);

        let mut out = String::new();
        for token in tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Field(field) => out.push_str(&self.resolve_field(field, &repo, &digest)),
            }
        }
        out
    }

    fn resolve_field(&self, field: &RefField, repo: &Repository, digest: &TestDigest) -> String {
        match field {
            RefField::Registry => repo.registry_str(),
            RefField::Repo => repo.repository_str().to_owned(),
            RefField::RegistryRepo => repo.name(),
            RefField::Tag => self.constants.tag.clone(),
            RefField::Digest => digest.to_string(),
            RefField::PseudoTag => format!("{}@{digest}", self.constants.tag),
            RefField::Ref => repo.digest(digest),
            // Unrecognized markers substitute to "", never an error.
            RefField::Unknown(name) => {
                trace!("unknown marker '{name}' resolved to empty string");
                String::new()
            }
        }
    }
}

/// Resolve one token sequence against `test_registry` with the default
/// test constants.
pub fn resolve_reference(
    test_registry: &str,
    image_id: &str,
    tokens: &[Token],
) -> Result<String, ReferenceError> {
    let resolver = TestResolver::parse(test_registry, TestConstants::default())?;
    Ok(resolver.resolve(image_id, tokens))
}
