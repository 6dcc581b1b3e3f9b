use super::{Error, ErrorKind};
use std::fmt::Display;

pub const UNEXPECTED_TOKEN: &str = "unexpected token";
pub const UNEXPECTED_EOF: &str = "unexpected eof";
pub const UNEXPECTED_CLOSE: &str = "unexpected closing tag";
pub const INVALID_SYNTAX: &str = "invalid syntax";
pub const UNRESOLVED_HELPER: &str = "unresolved helper";
pub const INVALID_ARGUMENTS: &str = "invalid arguments";
pub const INVALID_ARGUMENT_TYPE: &str = "invalid argument type";
pub const INACCESSIBLE_PROPERTY: &str = "inaccessible property";
pub const INVALID_CONFIGURATION: &str = "invalid helper configuration";

/// Return an [`Error`] explaining that the end of source was not expected.
pub fn error_eof(source: &str) -> Error {
    let source_len = source.len();
    Error::of(ErrorKind::Parse, UNEXPECTED_EOF)
        .with_pointer(source, (source_len..source_len).into())
        .with_help("expected additional input, did you close all tags and interpolations?")
}

/// Return an [`Error`] explaining that the write operation failed.
///
/// This is likely caused by a failure during a `write!` macro operation.
pub fn error_write() -> Error {
    Error::build("write failure")
        .with_help("failed to write result of render, are you low on memory?")
}

/// Return an [`Error`] describing a missing template.
pub fn error_missing_template(name: &str) -> Error {
    Error::of(ErrorKind::Source, "missing template").with_help(format!(
        "template `{name}` not found in engine, add it with `.add_template` \
        or attach a source with `.with_source`"
    ))
}

/// Return a string listing the given argument names for help text.
pub fn list_names<T>(names: &[T]) -> String
where
    T: Display,
{
    names
        .iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::list_names;

    #[test]
    fn test_list_names() {
        assert_eq!(list_names(&["value", "extra"]), "`value`, `extra`");
        assert_eq!(list_names::<&str>(&[]), "");
    }
}
