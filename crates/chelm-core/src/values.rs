use crate::constants::TestConstants;
use crate::merge::{ConflictPolicy, Merger};
use crate::resolver::TestResolver;
use crate::CoreError;
use chelm_schema::{ChartMeta, ImageError, ImageMapping, Values};
use serde_json::Value;
use tracing::{debug, info};

/// Produces merged test values for a chart's test cases.
///
/// A generator holds only immutable settings, so one instance can serve any
/// number of calls, including from several threads at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generator {
    constants: TestConstants,
    test_registry: Option<String>,
    merger: Merger,
}

impl Generator {
    pub fn new(constants: TestConstants) -> Self {
        Self {
            constants,
            test_registry: None,
            merger: Merger::default(),
        }
    }

    /// Use `registry` instead of the configured default test registry.
    #[must_use]
    pub fn with_registry(mut self, registry: impl Into<String>) -> Self {
        self.test_registry = Some(registry.into());
        self
    }

    #[must_use]
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.merger = Merger::new(policy);
        self
    }

    /// Registry used for test references.
    pub fn test_registry(&self) -> &str {
        self.test_registry
            .as_deref()
            .unwrap_or(&self.constants.registry)
    }

    pub fn constants(&self) -> &TestConstants {
        &self.constants
    }

    pub fn resolver(&self) -> Result<TestResolver, CoreError> {
        Ok(TestResolver::parse(
            self.test_registry(),
            self.constants.clone(),
        )?)
    }

    /// Resolve every marker in `images` and merge the per-image trees.
    ///
    /// The test registry is validated even when no images are declared; the
    /// result is `None` in that case.
    pub fn image_values(&self, images: &ImageMapping) -> Result<Option<Values>, CoreError> {
        let resolver = self.resolver()?;
        if images.is_empty() {
            return Ok(None);
        }
        let walked = images.walk(|id, tokens| {
            Ok::<_, ImageError>(Value::String(resolver.resolve(id, tokens)))
        })?;
        Ok(Some(walked.merge()?))
    }

    /// Build the values for test case `case_name`.
    ///
    /// Layers, lowest priority first: image values, the chart's global test
    /// values, the case's values, then `extra`.
    pub fn generate_values(
        &self,
        meta: &ChartMeta,
        case_name: &str,
        extra: Option<&Values>,
    ) -> Result<Values, CoreError> {
        let case = meta
            .case(case_name)
            .ok_or_else(|| CoreError::CaseNotFound(case_name.to_owned()))?;

        debug!(
            case = case_name,
            images = meta.images.len(),
            registry = self.test_registry(),
            "generating image values"
        );
        let image_vals = self.image_values(&meta.images)?;

        let values = self.merger.merge_layers([
            image_vals.as_ref(),
            Some(&meta.test.values),
            Some(&case.values),
            extra,
        ])?;
        info!(case = case_name, keys = values.len(), "generated values");
        Ok(values)
    }
}

/// Build the values for `case_name` against `test_registry` using the
/// default test constants.
pub fn generate_values(
    meta: &ChartMeta,
    case_name: &str,
    test_registry: &str,
    extra: Option<&Values>,
) -> Result<Values, CoreError> {
    Generator::default()
        .with_registry(test_registry)
        .generate_values(meta, case_name, extra)
}
