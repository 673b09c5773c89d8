//! Layered merging of configuration values.
//!
//! Layers are applied in order, so a later layer wins on any key it sets:
//! - maps merge recursively, key by key
//! - scalars and sequences are replaced wholesale
//! - keys a later layer does not mention are left alone
//! - an absent or empty layer changes nothing
//!
//! When one layer has a map and another has a non-map at the same key, the
//! [`ConflictPolicy`] decides. `null` on either side is never a conflict.

use chelm_schema::Values;
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("cannot merge {incoming} into {existing} at '{path}'")]
    Conflict {
        path: String,
        existing: &'static str,
        incoming: &'static str,
    },
}

/// How to handle a map meeting a non-map at the same key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// The later layer's value replaces the earlier one.
    #[default]
    Override,
    /// Fail with [`MergeError::Conflict`] naming the key path.
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Merger {
    policy: ConflictPolicy,
}

impl Merger {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Merge `layers` in increasing priority into a fresh map.
    pub fn merge_layers<'a, I>(&self, layers: I) -> Result<Values, MergeError>
    where
        I: IntoIterator<Item = Option<&'a Values>>,
    {
        let mut result = Values::new();
        for (index, layer) in layers.into_iter().enumerate() {
            let Some(layer) = layer else {
                trace!(layer = index, "skipping absent layer");
                continue;
            };
            trace!(layer = index, keys = layer.len(), "merging layer");
            self.merge_into(&mut result, layer)?;
        }
        Ok(result)
    }

    /// Merge `src` over `dst` in place.
    pub fn merge_into(&self, dst: &mut Values, src: &Values) -> Result<(), MergeError> {
        self.merge_at(dst, src, "")
    }

    fn merge_at(&self, dst: &mut Values, src: &Values, prefix: &str) -> Result<(), MergeError> {
        for (key, incoming) in src {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            let Some(existing) = dst.get_mut(key) else {
                dst.insert(key.clone(), incoming.clone());
                continue;
            };
            match (existing, incoming) {
                (Value::Object(existing), Value::Object(incoming)) => {
                    self.merge_at(existing, incoming, &path)?;
                }
                (existing, incoming) => {
                    if self.policy == ConflictPolicy::Reject
                        && !incoming.is_null()
                        && !existing.is_null()
                        && (existing.is_object() != incoming.is_object())
                    {
                        return Err(MergeError::Conflict {
                            path,
                            existing: kind(existing),
                            incoming: kind(incoming),
                        });
                    }
                    *existing = incoming.clone();
                }
            }
        }
        Ok(())
    }
}

/// Merge `layers` with [`ConflictPolicy::Override`].
pub fn merge_layers<'a, I>(layers: I) -> Result<Values, MergeError>
where
    I: IntoIterator<Item = Option<&'a Values>>,
{
    Merger::default().merge_layers(layers)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layer(v: Value) -> Values {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn merged(layers: &[Option<&Values>]) -> Value {
        Value::Object(merge_layers(layers.iter().copied()).unwrap())
    }

    #[test]
    fn later_layer_wins() {
        let a = layer(json!({"x": 1, "y": 2}));
        let b = layer(json!({"y": 3}));
        let c = layer(json!({"x": 4}));
        assert_eq!(
            merged(&[Some(&a), Some(&b), Some(&c)]),
            json!({"x": 4, "y": 3})
        );
    }

    #[test]
    fn nested_maps_merge_recursively() {
        let a = layer(json!({"n": {"a": 1, "b": 2}}));
        let b = layer(json!({"n": {"b": 3, "c": 4}}));
        assert_eq!(
            merged(&[Some(&a), Some(&b)]),
            json!({"n": {"a": 1, "b": 3, "c": 4}})
        );
    }

    #[test]
    fn deeply_nested_maps_merge() {
        let a = layer(json!({"l1": {"l2": {"l3": {"a": 1}}, "keep": true}}));
        let b = layer(json!({"l1": {"l2": {"l3": {"b": 2}}}}));
        assert_eq!(
            merged(&[Some(&a), Some(&b)]),
            json!({"l1": {"l2": {"l3": {"a": 1, "b": 2}}, "keep": true}})
        );
    }

    #[test]
    fn sequences_are_replaced() {
        let a = layer(json!({"args": ["--a", "--b", "--c"]}));
        let b = layer(json!({"args": ["--x"]}));
        assert_eq!(merged(&[Some(&a), Some(&b)]), json!({"args": ["--x"]}));
    }

    #[test]
    fn absent_and_empty_layers_are_identity() {
        let a = layer(json!({"x": 1, "n": {"a": 1}}));
        let b = layer(json!({"n": {"b": 2}}));
        let empty = Values::new();
        let expected = merged(&[Some(&a), Some(&b)]);
        assert_eq!(merged(&[None, Some(&a), Some(&b)]), expected);
        assert_eq!(merged(&[Some(&a), None, Some(&b)]), expected);
        assert_eq!(merged(&[Some(&a), Some(&b), None]), expected);
        assert_eq!(merged(&[Some(&a), Some(&empty), Some(&b)]), expected);
    }

    #[test]
    fn no_layers_is_empty() {
        assert!(merge_layers(std::iter::empty()).unwrap().is_empty());
    }

    #[test]
    fn inputs_are_not_mutated() {
        let a = layer(json!({"n": {"a": 1}}));
        let b = layer(json!({"n": {"b": 2}}));
        let a_before = a.clone();
        merge_layers([Some(&a), Some(&b)]).unwrap();
        assert_eq!(a, a_before);
    }

    #[test]
    fn override_policy_replaces_mismatched_types() {
        let a = layer(json!({"image": {"tag": "1"}}));
        let b = layer(json!({"image": "nginx"}));
        assert_eq!(merged(&[Some(&a), Some(&b)]), json!({"image": "nginx"}));
        assert_eq!(
            merged(&[Some(&b), Some(&a)]),
            json!({"image": {"tag": "1"}})
        );
    }

    #[test]
    fn reject_policy_reports_key_path() {
        let a = layer(json!({"api": {"image": {"tag": "1"}}}));
        let b = layer(json!({"api": {"image": "nginx"}}));
        let err = Merger::new(ConflictPolicy::Reject)
            .merge_layers([Some(&a), Some(&b)])
            .unwrap_err();
        assert_eq!(
            err,
            MergeError::Conflict {
                path: "api.image".to_owned(),
                existing: "map",
                incoming: "string",
            }
        );
        assert!(err.to_string().contains("api.image"));
    }

    #[test]
    fn reject_policy_allows_same_shape_overrides() {
        let a = layer(json!({"x": 1, "args": [1], "n": {"a": 1}}));
        let b = layer(json!({"x": "one", "args": [2], "n": {"a": 2}}));
        let out = Merger::new(ConflictPolicy::Reject)
            .merge_layers([Some(&a), Some(&b)])
            .unwrap();
        assert_eq!(
            Value::Object(out),
            json!({"x": "one", "args": [2], "n": {"a": 2}})
        );
    }

    #[test]
    fn null_replaces_under_both_policies() {
        let a = layer(json!({"n": {"a": 1}}));
        let b = layer(json!({"n": null}));
        for policy in [ConflictPolicy::Override, ConflictPolicy::Reject] {
            let out = Merger::new(policy)
                .merge_layers([Some(&a), Some(&b)])
                .unwrap();
            assert_eq!(Value::Object(out), json!({"n": null}));
        }
    }

    #[test]
    fn key_order_follows_first_appearance() {
        let a = layer(json!({"b": 1, "a": 1}));
        let b = layer(json!({"c": 1, "a": 2}));
        let out = merge_layers([Some(&a), Some(&b)]).unwrap();
        let keys: Vec<_> = out.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}
