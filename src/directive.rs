//! # Field Directives
//!
//! Parses the comma separated `json` tag of a field into typed directives.
//! Component 0 is the name override (`-` skips the field), component 1 an
//! optional modifier. Anything unrecognised is ignored.

/// The metadata key read by default.
pub const DEFAULT_TAG_KEY: &str = "json";

/// Name component that removes a field from the schema.
pub const SKIP_MARKER: &str = "-";

/// One instruction carried by a field tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDirective {
    /// Use this external name instead of the declared one.
    Rename(String),
    /// Leave the field out of the model.
    Skip,
    /// The value is encoded as a JSON string.
    EncodeAsString,
    /// The field may be absent.
    Optional,
}

impl FieldDirective {
    /// Parses a raw tag value. A skip marker yields `[Skip]` alone.
    pub fn parse_all(tag: &str) -> Vec<FieldDirective> {
        if tag.is_empty() {
            return Vec::new();
        }
        let mut parts = tag.split(',');
        let mut directives = Vec::new();

        match parts.next() {
            Some(SKIP_MARKER) => return vec![FieldDirective::Skip],
            Some(name) if !name.is_empty() => {
                directives.push(FieldDirective::Rename(name.to_string()))
            }
            _ => {}
        }

        match parts.next() {
            Some("string") => directives.push(FieldDirective::EncodeAsString),
            Some("omitempty") => directives.push(FieldDirective::Optional),
            _ => {}
        }

        directives
    }
}

/// Directives of one field folded into plain settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// External name override.
    pub rename: Option<String>,
    /// Whether the field is excluded.
    pub skip: bool,
    /// Whether the value is encoded as a string.
    pub as_string: bool,
    /// Whether the field is left out of the required list.
    pub optional: bool,
}

impl FieldOptions {
    /// Parses an optional raw tag value.
    pub fn from_tag(tag: Option<&str>) -> Self {
        tag.map(FieldDirective::parse_all)
            .unwrap_or_default()
            .into_iter()
            .fold(Self::default(), |mut options, directive| {
                match directive {
                    FieldDirective::Rename(name) => options.rename = Some(name),
                    FieldDirective::Skip => options.skip = true,
                    FieldDirective::EncodeAsString => options.as_string = true,
                    FieldDirective::Optional => options.optional = true,
                }
                options
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_and_modifier() {
        assert_eq!(
            FieldDirective::parse_all("addr,omitempty"),
            vec![
                FieldDirective::Rename("addr".into()),
                FieldDirective::Optional
            ]
        );
        assert_eq!(
            FieldDirective::parse_all("id,string"),
            vec![
                FieldDirective::Rename("id".into()),
                FieldDirective::EncodeAsString
            ]
        );
    }

    #[test]
    fn test_skip_marker() {
        assert_eq!(FieldDirective::parse_all("-"), vec![FieldDirective::Skip]);
        assert_eq!(FieldDirective::parse_all("-,omitempty"), vec![FieldDirective::Skip]);
    }

    #[test]
    fn test_empty_name_keeps_declared_name() {
        assert_eq!(
            FieldDirective::parse_all(",omitempty"),
            vec![FieldDirective::Optional]
        );
        assert!(FieldDirective::parse_all("").is_empty());
    }

    #[test]
    fn test_unknown_and_extra_modifiers_ignored() {
        assert_eq!(
            FieldDirective::parse_all("name,inline"),
            vec![FieldDirective::Rename("name".into())]
        );
        // Only the first modifier is considered.
        assert_eq!(
            FieldDirective::parse_all("name,omitempty,string"),
            vec![
                FieldDirective::Rename("name".into()),
                FieldDirective::Optional
            ]
        );
    }

    #[test]
    fn test_options_fold() {
        let options = FieldOptions::from_tag(Some("bar,string"));
        assert_eq!(options.rename.as_deref(), Some("bar"));
        assert!(options.as_string);
        assert!(!options.optional);
        assert!(!options.skip);

        assert_eq!(FieldOptions::from_tag(None), FieldOptions::default());
    }
}
