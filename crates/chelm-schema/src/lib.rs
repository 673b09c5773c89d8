//! Chart metadata, image mappings, and image reference primitives for chelm.
//!
//! This crate defines the data layer: chart metadata parsing (`ChartMeta`),
//! declared image sets with templated values (`ImageMapping`), tokenization of
//! `${marker}` templates (`parse_template`), registry and repository
//! references (`Registry`, `Repository`), and deterministic test digests
//! (`TestDigest`).

pub mod digest;
pub mod images;
pub mod meta;
pub mod reference;
pub mod template;
pub mod types;

pub use digest::TestDigest;
pub use images::{ImageError, ImageMapping, ImageSpec, WalkedImages};
pub use meta::{
    parse_meta_file, parse_meta_str, parse_values_file, ChartMeta, Format, MetaError, TestCase,
    TestSection,
};
pub use reference::{ReferenceError, Registry, Repository};
pub use template::{has_markers, parse_template, RefField, TemplateError, Token, TokenList};
pub use types::{CaseName, ImageId, Values};
