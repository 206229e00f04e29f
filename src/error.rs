//! # Error Handling
//!
//! Provides the unified `AppError` enum used by the fallible edges of the crate
//! (source parsing, file IO and rendering). Model extraction itself never fails.

use derive_more::{Display, From};
use std::{
    borrow::Cow,
    ffi::OsStr,
    fmt,
    path::{Path, PathBuf},
};

/// The crate error enum.
///
/// We use `derive_more` for boilerplate.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Rust source that `syn` could not parse.
    #[display("{_0}")]
    Parse(ParseError),

    /// A root type that is not declared in the parsed source.
    #[from(ignore)]
    #[display("Unknown type '{_0}'")]
    UnknownType(String),

    /// A field type with no descriptor mapping.
    #[from(ignore)]
    #[display("Unsupported type `{ty}` for field '{field}' of '{owner}'")]
    UnsupportedType {
        /// The struct declaring the field.
        owner: String,
        /// The field name.
        field: String,
        /// The offending type, rendered from tokens.
        ty: String,
    },

    /// Two source items resolving to the same schema name.
    #[from(ignore)]
    #[display("Duplicate type '{_0}'")]
    DuplicateType(String),

    /// JSON rendering failure.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// YAML rendering failure.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),
}

impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

/// A `syn` parse failure together with the code it was raised on.
#[derive(Debug)]
pub struct ParseError {
    /// The underlying syn error (carries the span).
    pub error: syn::Error,
    /// The file the code was read from, if any.
    pub filepath: Option<PathBuf>,
    /// The full source code.
    pub source_code: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        render_location(f, &self.error, self.filepath.as_deref(), &self.source_code)
    }
}

fn render_location(
    formatter: &mut fmt::Formatter,
    err: &syn::Error,
    filepath: Option<&Path>,
    code: &str,
) -> fmt::Result {
    let start = err.span().start();
    let mut end = err.span().end();

    if start.line == 0 || (start.line == end.line && start.column == end.column) {
        return render_fallback(formatter, err);
    }

    let code_line = match code.lines().nth(start.line - 1) {
        Some(line) => line,
        None => return render_fallback(formatter, err),
    };

    if end.line > start.line {
        end.line = start.line;
        end.column = code_line.len();
    }

    let filename = filepath
        .and_then(Path::file_name)
        .map(OsStr::to_string_lossy)
        .unwrap_or(Cow::Borrowed("<source>"));

    write!(
        formatter,
        "\n\
         error: unable to parse Rust source\n\
         {indent}--> {filename}:{linenum}:{colnum}\n\
         {indent} |\n\
         {label} | {code}\n\
         {indent} | {offset}{underline} {message}\n\
         ",
        indent = " ".repeat(start.line.to_string().len()),
        filename = filename,
        linenum = start.line,
        colnum = start.column,
        label = start.line,
        code = code_line.trim_end(),
        offset = " ".repeat(start.column),
        underline = "^".repeat(end.column.saturating_sub(start.column).max(1)),
        message = err,
    )
}

fn render_fallback(formatter: &mut fmt::Formatter, err: &syn::Error) -> fmt::Result {
    write!(formatter, "Unable to parse Rust source: {}", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::NotFound, "missing");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_unknown_type_display() {
        let err = AppError::UnknownType("Person".into());
        assert_eq!(err.to_string(), "Unknown type 'Person'");
    }

    #[test]
    fn test_unsupported_type_display() {
        let err = AppError::UnsupportedType {
            owner: "Job".into(),
            field: "run".into(),
            ty: "fn()".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported type `fn()` for field 'run' of 'Job'"
        );
    }

    #[test]
    fn test_parse_error_points_at_line() {
        let code = "struct Ok {}\nstruct Broken { a: i32 b: i32 }\n";
        let error = syn::parse_file(code).expect_err("should fail");
        let err = AppError::from(ParseError {
            error,
            filepath: Some(PathBuf::from("/tmp/models.rs")),
            source_code: code.to_string(),
        });
        let rendered = err.to_string();
        assert!(rendered.contains("models.rs:2:"), "{rendered}");
        assert!(rendered.contains("struct Broken { a: i32 b: i32 }"), "{rendered}");
    }
}
