use super::{json_pretty, load_config, EXIT_SUCCESS};
use chelm_core::TestResolver;
use chelm_schema::{has_markers, parse_template};
use std::path::Path;
use tracing::warn;

pub fn run(
    config_path: Option<&Path>,
    image_id: &str,
    template: &str,
    registry: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let config = load_config(config_path)?;
    let registry = registry.map_or_else(|| config.test.registry.clone(), str::to_owned);
    let resolver = TestResolver::parse(&registry, config.test)
        .map_err(|e| format!("invalid marker base: {e}"))?;

    if !has_markers(template) {
        warn!("template '{template}' contains no markers");
    }
    let tokens = parse_template(template).map_err(|e| e.to_string())?;
    let resolved = resolver.resolve(image_id, &tokens);

    if json {
        let payload = serde_json::json!({
            "image_id": image_id,
            "template": template,
            "tokens": tokens,
            "resolved": resolved,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{resolved}");
    }
    Ok(EXIT_SUCCESS)
}
