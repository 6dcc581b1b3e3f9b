/// Describes the internal state of a [`Lexer`][`super::Lexer`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CursorState {
    /// Outside of tags and interpolations.
    Text,
    /// Inside an opening tag, between its name and its `>` or `/>`.
    Attribute,
    /// Inside an interpolation.
    Interpolation {
        /// Count of unclosed `{` opened within the interpolation.
        depth: usize,
    },
}
