//! # Attribute Operations
//!
//! Reads `#[serde(...)]` and `#[serde_as(...)]` attributes and folds them into
//! the comma separated tag format the model builder understands.

use crate::directive::SKIP_MARKER;
use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, ExprLit, Lit, Token};
use tracing::warn;

/// A serde `rename_all` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    /// `lowercase`
    Lower,
    /// `UPPERCASE`
    Upper,
    /// `PascalCase`
    Pascal,
    /// `camelCase`
    Camel,
    /// `snake_case`
    Snake,
    /// `SCREAMING_SNAKE_CASE`
    ScreamingSnake,
    /// `kebab-case`
    Kebab,
    /// `SCREAMING-KEBAB-CASE`
    ScreamingKebab,
}

impl RenameRule {
    /// Parses the serde spelling of a rule.
    pub fn parse(rule: &str) -> Option<RenameRule> {
        match rule {
            "lowercase" => Some(RenameRule::Lower),
            "UPPERCASE" => Some(RenameRule::Upper),
            "PascalCase" => Some(RenameRule::Pascal),
            "camelCase" => Some(RenameRule::Camel),
            "snake_case" => Some(RenameRule::Snake),
            "SCREAMING_SNAKE_CASE" => Some(RenameRule::ScreamingSnake),
            "kebab-case" => Some(RenameRule::Kebab),
            "SCREAMING-KEBAB-CASE" => Some(RenameRule::ScreamingKebab),
            _ => None,
        }
    }

    /// Applies the rule to a snake_case field name.
    pub fn apply(self, name: &str) -> String {
        match self {
            RenameRule::Lower => name.to_lowercase(),
            RenameRule::Upper => name.to_uppercase(),
            RenameRule::Pascal => name.to_upper_camel_case(),
            RenameRule::Camel => name.to_lower_camel_case(),
            RenameRule::Snake => name.to_snake_case(),
            RenameRule::ScreamingSnake => name.to_shouty_snake_case(),
            RenameRule::Kebab => name.to_kebab_case(),
            RenameRule::ScreamingKebab => name.to_shouty_kebab_case(),
        }
    }
}

/// Serde settings found on a struct or a field.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct SerdeAttrs {
    /// `rename = "..."` (or its `serialize` half).
    pub rename: Option<String>,
    /// Raw `rename_all = "..."` value.
    pub rename_all: Option<String>,
    /// `skip` or `skip_serializing`.
    pub skip: bool,
    /// `default` or `skip_serializing_if`.
    pub optional: bool,
    /// Serialized through a string adapter.
    pub as_string: bool,
    /// Container level `transparent`.
    pub transparent: bool,
}

impl SerdeAttrs {
    /// Collects serde settings from an attribute list.
    ///
    /// Parsing stops at the first malformed entry of an attribute; the entries
    /// before it still apply and the error is logged.
    pub fn from_attributes(attrs: &[Attribute]) -> Self {
        let mut info = SerdeAttrs::default();
        for attr in attrs {
            if attr.path().is_ident("serde") {
                if let Err(error) = attr.parse_nested_meta(|meta| info.apply_serde_meta(&meta)) {
                    warn!(%error, "malformed serde attribute partially ignored");
                }
            } else if attr.path().is_ident("serde_as") {
                if let Ok(list) = attr.meta.require_list() {
                    let tokens = list.tokens.to_string();
                    if tokens.contains("DisplayFromStr") {
                        info.as_string = true;
                    }
                }
            }
        }
        info
    }

    fn apply_serde_meta(&mut self, meta: &ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("rename") {
            if let Some(value) = string_value_or_serialize(meta)? {
                self.rename = Some(value);
            }
        } else if meta.path.is_ident("rename_all") {
            if let Some(value) = string_value_or_serialize(meta)? {
                self.rename_all = Some(value);
            }
        } else if meta.path.is_ident("transparent") {
            self.transparent = true;
        } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
            self.skip = true;
        } else if meta.path.is_ident("default") || meta.path.is_ident("skip_serializing_if") {
            self.optional = true;
            consume(meta)?;
        } else if meta.path.is_ident("with") || meta.path.is_ident("serialize_with") {
            if let Some(value) = string_value(meta)? {
                let lowered = value.to_lowercase();
                if lowered.contains("string") || lowered.contains("fromstr") {
                    self.as_string = true;
                }
            }
        } else {
            consume(meta)?;
        }
        Ok(())
    }

    /// The tag string for a field, or `None` when nothing overrides the defaults.
    ///
    /// A tag carries a single modifier, so `string` takes precedence over
    /// `omitempty`.
    pub fn json_tag(&self, field_name: &str, rename_all: Option<RenameRule>) -> Option<String> {
        if self.skip {
            return Some(SKIP_MARKER.to_string());
        }
        let name = self
            .rename
            .clone()
            .or_else(|| rename_all.map(|rule| rule.apply(field_name)))
            .unwrap_or_default();
        let modifier = if self.as_string {
            Some("string")
        } else if self.optional {
            Some("omitempty")
        } else {
            None
        };
        match modifier {
            Some(modifier) => Some(format!("{},{}", name, modifier)),
            None if name.is_empty() => None,
            None => Some(name),
        }
    }
}

/// Strips the `r#` prefix from raw identifiers.
pub fn strip_raw_prefix(ident: &str) -> &str {
    ident.strip_prefix("r#").unwrap_or(ident)
}

fn string_value(meta: &ParseNestedMeta) -> syn::Result<Option<String>> {
    if !meta.input.peek(Token![=]) {
        consume(meta)?;
        return Ok(None);
    }
    match meta.value()?.parse::<Expr>()? {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(Some(s.value())),
        _ => Ok(None),
    }
}

/// `key = "v"` or `key(serialize = "v", deserialize = "w")`.
fn string_value_or_serialize(meta: &ParseNestedMeta) -> syn::Result<Option<String>> {
    if meta.input.peek(syn::token::Paren) {
        let mut found = None;
        meta.parse_nested_meta(|inner| {
            if inner.path.is_ident("serialize") {
                found = string_value(&inner)?;
            } else {
                consume(&inner)?;
            }
            Ok(())
        })?;
        return Ok(found);
    }
    string_value(meta)
}

fn consume(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let _content;
        syn::parenthesized!(_content in meta.input);
    }
    Ok(())
}
