use std::fmt::Display;

/// Types emitted by the Lexer.
///
/// An abstraction over raw text to make construction of Tree types easier.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Token {
    /// Raw text outside of tags and interpolations.
    Text,
    /// Name of an opening helper tag, without the `<`.
    TagOpen,
    /// Name of a closing helper tag, without `</` and `>`.
    TagClose,
    /// `>` ending an opening tag.
    TagEnd,
    /// `/>` ending a self-closing tag.
    TagSelfClose,
    /// Name of a tag attribute.
    AttributeName,
    /// Quoted attribute value, the region excludes the quotes.
    AttributeValue,
    /// `=` within a tag.
    Assign,
    /// `{` opening an interpolation.
    BeginInterpolation,
    /// `}` closing an interpolation.
    EndInterpolation,
    /// Unquoted name within an expression.
    Identifier,
    /// Namespaced helper name within an expression, such as `f:format.raw`.
    HelperName,
    /// Number within an expression.
    Number,
    /// Quoted string within an expression, the region includes the quotes.
    String,
    /// true
    True,
    /// false
    False,
    /// null
    Null,
    /// .
    Period,
    /// ,
    Comma,
    /// :
    Colon,
    /// ->
    Arrow,
    /// {
    LeftBrace,
    /// }
    RightBrace,
    /// [
    LeftBracket,
    /// ]
    RightBracket,
    /// (
    LeftParen,
    /// )
    RightParen,
    /// Whitespace within a tag or expression.
    Whitespace,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Text => write!(f, "text"),
            Token::TagOpen => write!(f, "opening tag"),
            Token::TagClose => write!(f, "closing tag"),
            Token::TagEnd => write!(f, "end of tag (>)"),
            Token::TagSelfClose => write!(f, "end of self-closing tag (/>)"),
            Token::AttributeName => write!(f, "attribute name"),
            Token::AttributeValue => write!(f, "attribute value"),
            Token::Assign => write!(f, "assign (=)"),
            Token::BeginInterpolation => write!(f, "begin interpolation"),
            Token::EndInterpolation => write!(f, "end interpolation"),
            Token::Identifier => write!(f, "identifier"),
            Token::HelperName => write!(f, "helper name"),
            Token::Number => write!(f, "number"),
            Token::String => write!(f, "string"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::Period => write!(f, "period (.)"),
            Token::Comma => write!(f, "comma (,)"),
            Token::Colon => write!(f, "colon (:)"),
            Token::Arrow => write!(f, "arrow (->)"),
            Token::LeftBrace => write!(f, "left brace ({{)"),
            Token::RightBrace => write!(f, "right brace (}})"),
            Token::LeftBracket => write!(f, "left bracket ([)"),
            Token::RightBracket => write!(f, "right bracket (])"),
            Token::LeftParen => write!(f, "left parenthesis (()"),
            Token::RightParen => write!(f, "right parenthesis ())"),
            Token::Whitespace => write!(f, "whitespace"),
        }
    }
}
