use serde::{Deserialize, Serialize};

/// Registry host used for test references unless the caller picks another.
pub const DEFAULT_TEST_REGISTRY: &str = "cgr.test";

/// Repository prefix every test image is placed under.
pub const DEFAULT_TEST_REPOSITORY: &str = "chainguard/test";

/// Tag every `${tag}` marker resolves to.
pub const DEFAULT_TEST_TAG: &str = "v0.0.0";

/// Fixed values that test references are built from.
///
/// Fixture assertions downstream depend on these literals, so the defaults
/// are part of the public contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConstants {
    #[serde(default = "default_registry")]
    pub registry: String,
    #[serde(default = "default_repository")]
    pub repository: String,
    #[serde(default = "default_tag")]
    pub tag: String,
}

impl Default for TestConstants {
    fn default() -> Self {
        Self {
            registry: default_registry(),
            repository: default_repository(),
            tag: default_tag(),
        }
    }
}

fn default_registry() -> String {
    DEFAULT_TEST_REGISTRY.to_owned()
}

fn default_repository() -> String {
    DEFAULT_TEST_REPOSITORY.to_owned()
}

fn default_tag() -> String {
    DEFAULT_TEST_TAG.to_owned()
}
