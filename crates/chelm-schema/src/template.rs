//! Tokenization of templated image reference strings.
//!
//! A templated string mixes literal text with `${marker}` placeholders, e.g.
//! `"${registry_repo}:${tag}"`. Each placeholder names one part of an image
//! reference. Marker names that are not recognized are kept as
//! [`RefField::Unknown`] so that newer metadata still tokenizes.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unterminated marker at byte {offset} in '{input}'")]
    Unterminated { input: String, offset: usize },
}

/// One semantic part of an image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefField {
    Registry,
    Repo,
    RegistryRepo,
    Tag,
    Digest,
    /// `<tag>@<digest>`
    PseudoTag,
    /// `<registry>/<repo>@<digest>`
    Ref,
    Unknown(String),
}

impl RefField {
    /// Map a marker name (the text between `${` and `}`) to a field.
    pub fn from_marker(name: &str) -> Self {
        match name.trim() {
            "registry" => Self::Registry,
            "repo" => Self::Repo,
            "registry_repo" => Self::RegistryRepo,
            "tag" => Self::Tag,
            "digest" => Self::Digest,
            "pseudo_tag" => Self::PseudoTag,
            "ref" => Self::Ref,
            other => Self::Unknown(other.to_owned()),
        }
    }

    pub fn marker(&self) -> &str {
        match self {
            Self::Registry => "registry",
            Self::Repo => "repo",
            Self::RegistryRepo => "registry_repo",
            Self::Tag => "tag",
            Self::Digest => "digest",
            Self::PseudoTag => "pseudo_tag",
            Self::Ref => "ref",
            Self::Unknown(name) => name,
        }
    }
}

impl fmt::Display for RefField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}}}", self.marker())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Token {
    Literal(String),
    Field(RefField),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Field(field) => field.fmt(f),
        }
    }
}

pub type TokenList = Vec<Token>;

/// Returns true if `input` contains at least one `${` marker opener.
pub fn has_markers(input: &str) -> bool {
    input.contains("${")
}

/// Split `input` into literal and field tokens, preserving order.
///
/// Adjacent literal text is coalesced into one token, and the empty string
/// yields an empty list. A lone `$` not followed by `{` is literal text.
pub fn parse_template(input: &str) -> Result<TokenList, TemplateError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        literal.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(TemplateError::Unterminated {
                input: input.to_owned(),
                offset: input.len() - rest.len() + start,
            });
        };
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(Token::Field(RefField::from_marker(&after[..end])));
        rest = &after[end + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_one_literal() {
        let tokens = parse_template("nginx").unwrap();
        assert_eq!(tokens, vec![Token::Literal("nginx".to_owned())]);
    }

    #[test]
    fn empty_string_has_no_tokens() {
        assert!(parse_template("").unwrap().is_empty());
    }

    #[test]
    fn mixed_literals_and_fields_keep_order() {
        let tokens = parse_template("${registry_repo}:${tag}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Field(RefField::RegistryRepo),
                Token::Literal(":".to_owned()),
                Token::Field(RefField::Tag),
            ]
        );
    }

    #[test]
    fn all_known_markers() {
        let tokens =
            parse_template("${registry}${repo}${registry_repo}${tag}${digest}${pseudo_tag}${ref}")
                .unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Field(RefField::Registry),
                Token::Field(RefField::Repo),
                Token::Field(RefField::RegistryRepo),
                Token::Field(RefField::Tag),
                Token::Field(RefField::Digest),
                Token::Field(RefField::PseudoTag),
                Token::Field(RefField::Ref),
            ]
        );
    }

    #[test]
    fn unknown_marker_is_kept() {
        let tokens = parse_template("x-${platform}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("x-".to_owned()),
                Token::Field(RefField::Unknown("platform".to_owned())),
            ]
        );
    }

    #[test]
    fn lone_dollar_is_literal() {
        let tokens = parse_template("$5 and $HOME").unwrap();
        assert_eq!(tokens, vec![Token::Literal("$5 and $HOME".to_owned())]);
    }

    #[test]
    fn unterminated_marker_is_error() {
        let err = parse_template("abc${tag").unwrap_err();
        assert_eq!(
            err,
            TemplateError::Unterminated {
                input: "abc${tag".to_owned(),
                offset: 3,
            }
        );
    }

    #[test]
    fn tokens_display_back_to_template() {
        let input = "${registry}/${repo}@${digest}";
        let rendered: String = parse_template(input)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(rendered, input);
    }
}
