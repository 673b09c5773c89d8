//! Declared image sets and their templated values.
//!
//! An [`ImageMapping`] lists every image a chart references. Each image carries
//! a value tree whose string leaves may contain `${marker}` templates.
//! [`ImageMapping::walk`] hands every string leaf, tokenized, to a callback and
//! rebuilds the trees from the results; [`WalkedImages::merge`] then folds all
//! per-image trees into one map.

use crate::template::{parse_template, TemplateError, TokenList};
use crate::types::{ImageId, Values};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("image '{image}' at '{path}': {source}")]
    Template {
        image: ImageId,
        path: String,
        source: TemplateError,
    },
    #[error("images '{first}' and '{second}' set conflicting values at '{path}'")]
    Conflict {
        path: String,
        first: ImageId,
        second: ImageId,
    },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImageSpec {
    /// Value tree contributed by this image. String leaves are templates.
    #[serde(default)]
    pub values: Values,
}

/// Every image declared by a chart, keyed and ordered by [`ImageId`].
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct ImageMapping {
    pub images: BTreeMap<ImageId, ImageSpec>,
}

impl ImageMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<ImageId>, values: Values) {
        self.images.insert(id.into(), ImageSpec { values });
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ImageId> {
        self.images.keys()
    }

    /// Rebuild every image's value tree, replacing each string leaf with what
    /// `resolve` returns for its tokens. Non-string leaves are copied as-is.
    pub fn walk<F, E>(&self, mut resolve: F) -> Result<WalkedImages, E>
    where
        F: FnMut(&ImageId, &TokenList) -> Result<Value, E>,
        E: From<ImageError>,
    {
        let mut images = Vec::with_capacity(self.images.len());
        for (id, spec) in &self.images {
            let mut out = Values::new();
            for (key, value) in &spec.values {
                let walked = walk_value(id, key, value, &mut resolve)?;
                out.insert(key.clone(), walked);
            }
            images.push((id.clone(), out));
        }
        Ok(WalkedImages { images })
    }
}

fn walk_value<F, E>(id: &ImageId, path: &str, value: &Value, resolve: &mut F) -> Result<Value, E>
where
    F: FnMut(&ImageId, &TokenList) -> Result<Value, E>,
    E: From<ImageError>,
{
    match value {
        Value::String(s) => {
            let tokens = parse_template(s).map_err(|source| ImageError::Template {
                image: id.clone(),
                path: path.to_owned(),
                source,
            })?;
            resolve(id, &tokens)
        }
        Value::Object(map) => {
            let mut out = Values::new();
            for (key, child) in map {
                let child_path = format!("{path}.{key}");
                out.insert(key.clone(), walk_value(id, &child_path, child, resolve)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, child) in items.iter().enumerate() {
                out.push(walk_value(id, &format!("{path}[{i}]"), child, resolve)?);
            }
            Ok(Value::Array(out))
        }
        other => Ok(other.clone()),
    }
}

/// Per-image value trees produced by [`ImageMapping::walk`], in image order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkedImages {
    pub images: Vec<(ImageId, Values)>,
}

impl WalkedImages {
    /// Fold all per-image trees into one map.
    ///
    /// Maps are merged key by key. Two images may write the same leaf only if
    /// they write the same value; anything else is an [`ImageError::Conflict`].
    pub fn merge(self) -> Result<Values, ImageError> {
        let mut merged = Values::new();
        let mut owners: BTreeMap<String, ImageId> = BTreeMap::new();
        for (id, values) in self.images {
            merge_into(&mut merged, values, &id, "", &mut owners)?;
        }
        Ok(merged)
    }
}

fn merge_into(
    dst: &mut Values,
    src: Values,
    id: &ImageId,
    prefix: &str,
    owners: &mut BTreeMap<String, ImageId>,
) -> Result<(), ImageError> {
    for (key, value) in src {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        let Some(existing) = dst.get_mut(&key) else {
            owners.insert(path, id.clone());
            dst.insert(key, value);
            continue;
        };
        match (existing, value) {
            (Value::Object(existing), Value::Object(incoming)) => {
                merge_into(existing, incoming, id, &path, owners)?;
            }
            (existing, incoming) => {
                if *existing != incoming {
                    let first = owners
                        .iter()
                        .find(|(p, _)| is_same_or_nested(p, &path))
                        .map_or_else(|| id.clone(), |(_, owner)| owner.clone());
                    return Err(ImageError::Conflict {
                        path,
                        first,
                        second: id.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn is_same_or_nested(owned: &str, path: &str) -> bool {
    owned == path || owned.starts_with(&format!("{path}.")) || path.starts_with(&format!("{owned}."))
}
