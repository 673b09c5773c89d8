use super::{json_pretty, load_config, load_meta, EXIT_SUCCESS};
use chelm_core::{ConflictPolicy, Generator, Merger};
use chelm_schema::{parse_values_file, Values};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Toml,
}

#[derive(Debug, Clone)]
pub struct ValuesOptions {
    pub registry: Option<String>,
    pub values_files: Vec<PathBuf>,
    pub set: Vec<String>,
    pub strict: bool,
    pub format: OutputFormat,
}

pub fn run(
    config_path: Option<&Path>,
    meta_path: &Path,
    case: &str,
    options: &ValuesOptions,
) -> Result<u8, String> {
    let config = load_config(config_path)?;
    let meta = load_meta(meta_path)?;
    let policy = if options.strict {
        ConflictPolicy::Reject
    } else {
        ConflictPolicy::Override
    };
    let extra = build_extra(&options.values_files, &options.set, policy)?;

    let mut generator = Generator::new(config.test).with_conflict_policy(policy);
    if let Some(registry) = &options.registry {
        generator = generator.with_registry(registry.clone());
    }

    let mut values = generator
        .generate_values(&meta, case, extra.as_ref())
        .map_err(|e| e.to_string())?;

    match options.format {
        OutputFormat::Json => println!("{}", json_pretty(&values)?),
        OutputFormat::Toml => {
            strip_nulls(&mut values);
            print!(
                "{}",
                toml::to_string_pretty(&values)
                    .map_err(|e| format!("TOML serialization failed: {e}"))?
            );
        }
    }
    Ok(EXIT_SUCCESS)
}

/// Remove `null` map entries and array items. TOML has no null, so an unset
/// key is the closest rendering.
fn strip_nulls(values: &mut Values) {
    values.retain(|_, v| !v.is_null());
    for value in values.values_mut() {
        strip_value_nulls(value);
    }
}

fn strip_value_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => strip_nulls(map),
        Value::Array(items) => {
            items.retain(|v| !v.is_null());
            for item in items {
                strip_value_nulls(item);
            }
        }
        _ => {}
    }
}

/// Fold `--values` files, then `--set` assignments, into one override layer
/// under `policy`.
fn build_extra(
    files: &[PathBuf],
    sets: &[String],
    policy: ConflictPolicy,
) -> Result<Option<Values>, String> {
    if files.is_empty() && sets.is_empty() {
        return Ok(None);
    }

    let mut layers = Vec::with_capacity(files.len() + 1);
    for file in files {
        debug!("reading values file {}", file.display());
        let layer = parse_values_file(file)
            .map_err(|e| format!("values file {}: {e}", file.display()))?;
        layers.push(layer);
    }

    let mut assignments = Values::new();
    for set in sets {
        let (path, value) = parse_set(set)?;
        insert_path(&mut assignments, &path, value);
    }
    layers.push(assignments);

    Merger::new(policy)
        .merge_layers(layers.iter().map(Some))
        .map(Some)
        .map_err(|e| e.to_string())
}

/// Parse `a.b.c=value`. The value is read as JSON when possible (numbers,
/// booleans, null, arrays, objects, quoted strings) and as a plain string
/// otherwise.
fn parse_set(input: &str) -> Result<(Vec<String>, Value), String> {
    let Some((key, raw)) = input.split_once('=') else {
        return Err(format!("invalid --set '{input}', expected key=value"));
    };
    let path: Vec<String> = key.split('.').map(|s| s.trim().to_owned()).collect();
    if path.iter().any(String::is_empty) {
        return Err(format!("invalid --set key '{key}'"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
    Ok((path, value))
}

fn insert_path(target: &mut Values, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = target;
    for key in parents {
        let entry = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Values::new()));
        if !entry.is_object() {
            *entry = Value::Object(Values::new());
        }
        let Value::Object(map) = entry else {
            unreachable!("entry was just made an object")
        };
        current = map;
    }
    current.insert(last.clone(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_set_reads_json_scalars() {
        assert_eq!(
            parse_set("a.b=3").unwrap(),
            (vec!["a".to_owned(), "b".to_owned()], json!(3))
        );
        assert_eq!(parse_set("flag=true").unwrap().1, json!(true));
        assert_eq!(parse_set("x=null").unwrap().1, Value::Null);
        assert_eq!(parse_set("list=[1,2]").unwrap().1, json!([1, 2]));
    }

    #[test]
    fn parse_set_falls_back_to_string() {
        assert_eq!(parse_set("tag=v1.2.3").unwrap().1, json!("v1.2.3"));
        assert_eq!(parse_set("empty=").unwrap().1, json!(""));
        assert_eq!(parse_set("url=a=b").unwrap().1, json!("a=b"));
    }

    #[test]
    fn parse_set_rejects_bad_input() {
        assert!(parse_set("novalue").is_err());
        assert!(parse_set("a..b=1").is_err());
        assert!(parse_set("=1").is_err());
    }

    #[test]
    fn insert_path_builds_nested_maps() {
        let mut v = Values::new();
        insert_path(&mut v, &["a".to_owned(), "b".to_owned()], json!(1));
        insert_path(&mut v, &["a".to_owned(), "c".to_owned()], json!(2));
        assert_eq!(Value::Object(v), json!({"a": {"b": 1, "c": 2}}));
    }

    #[test]
    fn insert_path_replaces_scalar_parent() {
        let mut v = Values::new();
        insert_path(&mut v, &["a".to_owned()], json!("x"));
        insert_path(&mut v, &["a".to_owned(), "b".to_owned()], json!(1));
        assert_eq!(Value::Object(v), json!({"a": {"b": 1}}));
    }

    #[test]
    fn build_extra_is_none_without_overrides() {
        assert!(build_extra(&[], &[], ConflictPolicy::Override).unwrap().is_none());
    }

    #[test]
    fn build_extra_applies_set_after_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("extra.json");
        std::fs::write(&file, r#"{"api": {"replicas": 2, "debug": false}}"#).unwrap();
        let extra = build_extra(
            &[file],
            &["api.replicas=7".to_owned()],
            ConflictPolicy::Override,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            Value::Object(extra),
            json!({"api": {"replicas": 7, "debug": false}})
        );
    }

    #[test]
    fn build_extra_respects_reject_policy() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a.json");
        let flat = dir.path().join("b.json");
        std::fs::write(&nested, r#"{"api": {"image": {"tag": "1"}}}"#).unwrap();
        std::fs::write(&flat, r#"{"api": {"image": "flat"}}"#).unwrap();
        let files = [nested, flat];

        let err = build_extra(&files, &[], ConflictPolicy::Reject).unwrap_err();
        assert!(err.contains("api.image"), "{err}");

        let extra = build_extra(&files, &[], ConflictPolicy::Override)
            .unwrap()
            .unwrap();
        assert_eq!(Value::Object(extra), json!({"api": {"image": "flat"}}));
    }

    #[test]
    fn strip_nulls_drops_nested_entries() {
        let raw = json!({
            "a": null,
            "b": {"c": null, "d": 1},
            "e": [1, null, {"f": null}]
        });
        let Value::Object(mut v) = raw else {
            unreachable!()
        };
        strip_nulls(&mut v);
        assert_eq!(Value::Object(v), json!({"b": {"d": 1}, "e": [1, {}]}));
    }
}
