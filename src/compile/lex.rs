pub mod token;

mod state;

use self::{state::CursorState, token::Token};
use super::syntax::Marker;
use crate::{
    region::Region,
    report::{Error, ErrorKind, INVALID_SYNTAX, UNEXPECTED_TOKEN, UNRESOLVED_HELPER},
    resolver::Resolver,
};
use morel::Finder;

/// Result of reading a single [`Token`].
pub type LexResult = Result<Option<(Token, Region)>, Error>;

/// A helper tag or interpolation found while reading text.
struct Boundary {
    token: Token,
    region: Region,
    cursor: usize,
    state: CursorState,
}

/// Provides methods to read a source string as [`Token`] instances.
pub struct Lexer<'source> {
    /// Reference to the source text.
    pub source: &'source str,
    /// Position within source.
    pub cursor: usize,
    /// Compiled [`Finder`] instance used to search for markers
    /// in the source text.
    finder: &'source Finder,
    /// Decides which namespaces open helper tags.
    resolver: &'source Resolver,
    /// When true, tags in unregistered namespaces are read as text.
    passthrough: bool,
    /// When false, helper tags are read as text.
    tags: bool,
    /// Tracks the [`Lexer`] state and determines the action taken
    /// when `.next` is called.
    state: CursorState,
    /// Temporary storage for the a [`Token`] that will be read
    /// on the following call to `.next`
    buffer: Option<(Token, Region)>,
}

impl<'source> Lexer<'source> {
    /// Create a new [`Lexer`] over the whole source.
    #[inline]
    pub fn new(
        source: &'source str,
        finder: &'source Finder,
        resolver: &'source Resolver,
        passthrough: bool,
    ) -> Self {
        Self {
            source,
            cursor: 0,
            finder,
            resolver,
            passthrough,
            tags: true,
            state: CursorState::Text,
            buffer: None,
        }
    }

    /// Create a new [`Lexer`] over the given [`Region`] of the source, such as
    /// the content of an attribute value.
    ///
    /// Helper tags are not recognized, and emitted regions remain relative to
    /// the whole source.
    #[inline]
    pub fn fragment(
        source: &'source str,
        region: Region,
        finder: &'source Finder,
        resolver: &'source Resolver,
        passthrough: bool,
    ) -> Self {
        Self {
            source: source.get(..region.end).unwrap_or(source),
            cursor: region.begin,
            tags: false,
            ..Self::new(source, finder, resolver, passthrough)
        }
    }

    /// Return the next [`Token`] and [`Region`].
    ///
    /// Any instance of [`Token::Whitespace`] is ignored.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when an unexpected character is found, or when a
    /// tag uses a namespace that is not registered and passthrough is disabled.
    pub fn next(&mut self) -> LexResult {
        loop {
            // Always prefer taking from the buffer when possible.
            if let Some(next) = self.buffer.take() {
                return Ok(Some(next));
            }
            if self.cursor >= self.source.len() {
                return Ok(None);
            }

            let from = self.cursor;
            let result = match self.state {
                CursorState::Text => self.lex_text(from),
                CursorState::Attribute => self.lex_attribute(from),
                CursorState::Interpolation { depth } => self.lex_expression(from, depth),
            }?;

            return match result {
                Some((Token::Whitespace, _)) => continue,
                other => Ok(other),
            };
        }
    }

    /// Continue reading text right after the given [`Region`], discarding
    /// anything read past it.
    pub fn rewind(&mut self, region: Region) {
        self.cursor = region.end;
        self.state = CursorState::Text;
        self.buffer = None;
    }

    /// Return the next [`Token`] and [`Region`] while outside of tags and
    /// interpolations.
    ///
    /// Markers that do not begin a helper tag or an interpolation are read as
    /// part of the surrounding text.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a tag is found in an unregistered namespace
    /// and passthrough is disabled.
    fn lex_text(&mut self, from: usize) -> LexResult {
        let mut scan = from;
        let found = loop {
            let Some((id, begin, end)) = self.finder.next(self.source, scan) else {
                break None;
            };
            let boundary = match Marker::from(id) {
                Marker::BeginInterpolation => self.lex_interpolation_open(begin, end),
                Marker::BeginTag => self.lex_tag_boundary(end)?,
            };
            match boundary {
                Some(boundary) => break Some((begin, boundary)),
                None => scan = end,
            }
        };

        match found {
            Some((begin, boundary)) => {
                self.cursor = boundary.cursor;
                self.state = boundary.state;

                if begin > from {
                    self.buffer = Some((boundary.token, boundary.region));

                    Ok(Some((Token::Text, (from..begin).into())))
                } else {
                    Ok(Some((boundary.token, boundary.region)))
                }
            }
            None => {
                self.cursor = self.source.len();

                Ok(Some((Token::Text, (from..self.source.len()).into())))
            }
        }
    }

    /// Return a [`Boundary`] if the `{` found at `begin` opens an interpolation.
    ///
    /// Braces followed by anything other than the beginning of an expression
    /// are text.
    fn lex_interpolation_open(&self, begin: usize, end: usize) -> Option<Boundary> {
        let opens = matches!(
            self.char_at(end),
            Some(c) if is_ident_start(c)
                || c.is_ascii_digit()
                || matches!(c, '\'' | '"' | '-' | '[' | '{')
        );

        opens.then_some(Boundary {
            token: Token::BeginInterpolation,
            region: (begin..end).into(),
            cursor: end,
            state: CursorState::Interpolation { depth: 0 },
        })
    }

    /// Return a [`Boundary`] if the `<` ending at `end` opens a helper tag or a
    /// closing helper tag.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the tag uses an unregistered namespace and
    /// passthrough is disabled, or a closing tag is not finished with `>`.
    fn lex_tag_boundary(&self, end: usize) -> Result<Option<Boundary>, Error> {
        if !self.tags {
            return Ok(None);
        }

        let closing = self.char_at(end) == Some('/');
        let at = if closing { end + 1 } else { end };
        let Some((name, namespace)) = self.scan_name(at) else {
            return Ok(None);
        };
        let delimited = matches!(
            self.char_at(name.end),
            Some(c) if c.is_whitespace() || c == '>' || (c == '/' && !closing)
        );
        if !delimited {
            return Ok(None);
        }

        if !self.resolver.has_namespace(namespace) {
            if self.passthrough {
                return Ok(None);
            }

            return Err(Error::of(ErrorKind::UnresolvedHelper, UNRESOLVED_HELPER)
                .with_pointer(self.source, name)
                .with_help(format!(
                    "namespace `{namespace}` is not registered, register it or enable \
                    `passthrough_unknown_namespaces`"
                )));
        }

        if !closing {
            return Ok(Some(Boundary {
                token: Token::TagOpen,
                region: name,
                cursor: name.end,
                state: CursorState::Attribute,
            }));
        }

        let rest = &self.source[name.end..];
        let trimmed = rest.trim_start();
        if !trimmed.starts_with('>') {
            return Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                .with_pointer(self.source, name)
                .with_help(format!("expected `>` to finish closing tag `{}`", &self.source[name])));
        }

        Ok(Some(Boundary {
            token: Token::TagClose,
            region: name,
            cursor: name.end + (rest.len() - trimmed.len()) + 1,
            state: CursorState::Text,
        }))
    }

    /// Return the next [`Token`] and [`Region`] while inside an opening tag.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when an unexpected character is found, or an
    /// attribute value is not terminated.
    fn lex_attribute(&mut self, from: usize) -> LexResult {
        let source = self.source;
        let mut iter = source[from..].char_indices().map(|(d, c)| (from + d, c));
        let Some((index, char)) = iter.next() else {
            return Ok(None);
        };

        match char {
            c if c.is_whitespace() => Ok(Some(self.lex_whitespace(iter, index))),
            '>' => {
                self.state = CursorState::Text;
                self.advance(index, 1, Token::TagEnd)
            }
            '/' if self.char_at(index + 1) == Some('>') => {
                self.state = CursorState::Text;
                self.advance(index, 2, Token::TagSelfClose)
            }
            '=' => self.advance(index, 1, Token::Assign),
            '"' | '\'' => self.lex_attribute_value(iter, index, char),
            c if is_ident_start(c) => Ok(Some(self.lex_attribute_name(iter, index))),
            _ => Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                .with_pointer(source, (index..index + char.len_utf8()).into())
                .with_help("expected an attribute name, `=`, a quoted value, `>` or `/>`")),
        }
    }

    /// Return a [`Token`] and [`Region`] containing [`Token::AttributeName`].
    fn lex_attribute_name<T>(&mut self, iter: T, from: usize) -> (Token, Region)
    where
        T: Iterator<Item = (usize, char)>,
    {
        let end = self.take_while(iter, |c| {
            is_ident_continue(c) || matches!(c, '-' | ':' | '.')
        });
        self.cursor = end;

        (Token::AttributeName, (from..end).into())
    }

    /// Return a [`Token`] and [`Region`] containing [`Token::AttributeValue`].
    ///
    /// Quotes inside of braces belong to the expression and do not end the value.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the value is not terminated.
    fn lex_attribute_value<T>(&mut self, iter: T, from: usize, quote: char) -> LexResult
    where
        T: Iterator<Item = (usize, char)>,
    {
        let mut depth = 0_usize;
        let mut literal: Option<char> = None;
        let mut previous = quote;

        for (index, char) in iter {
            match literal {
                Some(open) => {
                    if char == open && previous != '\\' {
                        literal = None;
                    }
                }
                None => match char {
                    '{' => depth += 1,
                    '}' => depth = depth.saturating_sub(1),
                    '\'' | '"' if depth > 0 => literal = Some(char),
                    c if c == quote => {
                        self.cursor = index + 1;

                        return Ok(Some((Token::AttributeValue, (from + 1..index).into())));
                    }
                    _ => {}
                },
            }
            previous = char;
        }

        Err(Error::of(ErrorKind::Parse, INVALID_SYNTAX)
            .with_pointer(self.source, (from..from + 1).into())
            .with_help(format!(
                "this might be an unterminated attribute value, try closing it with `{quote}`"
            )))
    }

    /// Return the next [`Token`] and [`Region`] while inside an interpolation.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when an unexpected character is found.
    fn lex_expression(&mut self, from: usize, depth: usize) -> LexResult {
        let source = self.source;
        let mut iter = source[from..].char_indices().map(|(d, c)| (from + d, c));
        let Some((index, char)) = iter.next() else {
            return Ok(None);
        };

        match char {
            c if c.is_whitespace() => Ok(Some(self.lex_whitespace(iter, index))),
            '}' if depth == 0 => {
                self.state = CursorState::Text;
                self.advance(index, 1, Token::EndInterpolation)
            }
            '}' => {
                self.state = CursorState::Interpolation { depth: depth - 1 };
                self.advance(index, 1, Token::RightBrace)
            }
            '{' => {
                self.state = CursorState::Interpolation { depth: depth + 1 };
                self.advance(index, 1, Token::LeftBrace)
            }
            '[' => self.advance(index, 1, Token::LeftBracket),
            ']' => self.advance(index, 1, Token::RightBracket),
            '(' => self.advance(index, 1, Token::LeftParen),
            ')' => self.advance(index, 1, Token::RightParen),
            ',' => self.advance(index, 1, Token::Comma),
            '.' => self.advance(index, 1, Token::Period),
            ':' => self.advance(index, 1, Token::Colon),
            '-' => match self.char_at(index + 1) {
                Some('>') => self.advance(index, 2, Token::Arrow),
                Some(c) if c.is_ascii_digit() => Ok(Some(self.lex_digit(iter, index))),
                _ => Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                    .with_pointer(source, (index..index + 1).into())
                    .with_help("expected `->` or a negative number")),
            },
            '"' | '\'' => self.lex_string(iter, index, char),
            c if c.is_ascii_digit() => Ok(Some(self.lex_digit(iter, index))),
            c if is_ident_start(c) => Ok(Some(self.lex_ident_or_keyword(index))),
            _ => Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                .with_pointer(source, (index..index + char.len_utf8()).into())
                .with_help(
                    "expected an identifier, a number, a quoted string, a helper name, \
                    `[`, `{`, `->` or the end of the interpolation `}`",
                )),
        }
    }

    /// Return a [`Token`] and [`Region`] containing [`Token::Number`].
    ///
    /// A period is part of the number only when a digit follows it, so
    /// `items.0.name` reads `0` as an accessor segment.
    fn lex_digit<T>(&mut self, iter: T, from: usize) -> (Token, Region)
    where
        T: Iterator<Item = (usize, char)>,
    {
        let mut end = self.source.len();
        let mut seen_period = false;

        for (index, char) in iter {
            if char.is_ascii_digit() {
                continue;
            }
            let fraction = self.char_at(index + 1).is_some_and(|c| c.is_ascii_digit());
            if char == '.' && !seen_period && fraction {
                seen_period = true;
                continue;
            }
            end = index;
            break;
        }
        self.cursor = end;

        (Token::Number, (from..end).into())
    }

    /// Return a [`Token`] and [`Region`] containing [`Token::Whitespace`].
    fn lex_whitespace<T>(&mut self, iter: T, from: usize) -> (Token, Region)
    where
        T: Iterator<Item = (usize, char)>,
    {
        let end = self.take_while(iter, char::is_whitespace);
        self.cursor = end;

        (Token::Whitespace, (from..end).into())
    }

    /// Return a [`Token`] and [`Region`] containing [`Token::String`] using
    /// the given iterator.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the string is not terminated.
    fn lex_string<T>(&mut self, iter: T, from: usize, quote: char) -> LexResult
    where
        T: Iterator<Item = (usize, char)>,
    {
        let mut previous = quote;
        for (index, char) in iter {
            // A quote ends the string unless the previous character escapes it.
            if char == quote && previous != '\\' {
                let to = index + 1;
                self.cursor = to;

                return Ok(Some((Token::String, (from..to).into())));
            }
            previous = char;
        }

        Err(Error::of(ErrorKind::Parse, INVALID_SYNTAX)
            .with_pointer(self.source, (from..from + 1).into())
            .with_help(format!(
                "this might be an undelimited string, try closing it with `{quote}`"
            )))
    }

    /// Return a [`Token`] and [`Region`] for the identifier beginning at `from`.
    ///
    /// The `Token` will be [`Token::Identifier`], a keyword, or
    /// [`Token::HelperName`] when the identifier is a registered namespace
    /// immediately followed by `:name`.
    fn lex_ident_or_keyword(&mut self, from: usize) -> (Token, Region) {
        let source = self.source;
        let end = from + ident_len(&source[from..]).unwrap_or(0);
        let token = match &source[from..end] {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            _ => Token::Identifier,
        };

        if token == Token::Identifier && self.resolver.has_namespace(&source[from..end]) {
            if let Some((name, _)) = self.scan_name(from) {
                self.cursor = name.end;

                return (Token::HelperName, name);
            }
        }
        self.cursor = end;

        (token, (from..end).into())
    }

    /// Read a namespaced name such as `f:format.raw` beginning at `at`.
    ///
    /// Returns the [`Region`] of the whole name and the namespace.
    fn scan_name(&self, at: usize) -> Option<(Region, &'source str)> {
        let source = self.source;
        let rest = source.get(at..)?;
        let namespace_len = ident_len(rest)?;
        let local = rest[namespace_len..].strip_prefix(':')?;
        let mut local_len = ident_len(local)?;
        while let Some(len) = local[local_len..].strip_prefix('.').and_then(ident_len) {
            local_len += 1 + len;
        }
        let end = at + namespace_len + 1 + local_len;

        Some(((at..end).into(), &rest[..namespace_len]))
    }

    /// Move the cursor past `length` bytes and return the given [`Token`].
    fn advance(&mut self, from: usize, length: usize, token: Token) -> LexResult {
        self.cursor = from + length;

        Ok(Some((token, (from..from + length).into())))
    }

    /// Return the index of the first character that does not satisfy the predicate.
    fn take_while<T, P>(&self, mut iter: T, predicate: P) -> usize
    where
        T: Iterator<Item = (usize, char)>,
        P: Fn(char) -> bool,
    {
        iter.find(|(_, c)| !predicate(*c))
            .map_or(self.source.len(), |(index, _)| index)
    }

    /// Return the character beginning at the given byte index.
    fn char_at(&self, index: usize) -> Option<char> {
        self.source.get(index..).and_then(|s| s.chars().next())
    }
}

/// Return the byte length of the identifier at the beginning of the text.
fn ident_len(text: &str) -> Option<usize> {
    let mut chars = text.char_indices();
    let (_, first) = chars.next()?;
    if !is_ident_start(first) {
        return None;
    }

    Some(
        chars
            .find(|(_, c)| !is_ident_continue(*c))
            .map_or(text.len(), |(index, _)| index),
    )
}

/// Return true if the given character is a recognized beginning identifier,
/// meaning '_' or an `xid_start`.
fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

/// Return true if the given character is a recognized continue identifier,
/// meaning an `xid_continue`.
fn is_ident_continue(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

#[cfg(test)]
mod tests {
    use super::{token::Token, Lexer};
    use crate::{compile::syntax::finder, report::ErrorKind, resolver::Resolver};
    use pretty_assertions::assert_eq;

    fn lex(source: &str, passthrough: bool) -> Result<Vec<(Token, &str)>, crate::Error> {
        let finder = finder();
        let resolver = Resolver::default();
        let mut lexer = Lexer::new(source, &finder, &resolver, passthrough);
        let mut tokens = vec![];
        while let Some((token, region)) = lexer.next()? {
            tokens.push((token, &source[region]));
        }

        Ok(tokens)
    }

    #[test]
    fn test_lex_tag() {
        assert_eq!(
            lex(r#"a<f:if condition="{x}">b</f:if >"#, true).unwrap(),
            vec![
                (Token::Text, "a"),
                (Token::TagOpen, "f:if"),
                (Token::AttributeName, "condition"),
                (Token::Assign, "="),
                (Token::AttributeValue, "{x}"),
                (Token::TagEnd, ">"),
                (Token::Text, "b"),
                (Token::TagClose, "f:if"),
            ]
        );
    }

    #[test]
    fn test_lex_self_closing_tag() {
        assert_eq!(
            lex("<f:format.raw value='<b>'/>", true).unwrap(),
            vec![
                (Token::TagOpen, "f:format.raw"),
                (Token::AttributeName, "value"),
                (Token::Assign, "="),
                (Token::AttributeValue, "<b>"),
                (Token::TagSelfClose, "/>"),
            ]
        );
    }

    #[test]
    fn test_lex_inline_helper() {
        assert_eq!(
            lex("{user.name -> f:format.case(mode: 'upper')}", true).unwrap(),
            vec![
                (Token::BeginInterpolation, "{"),
                (Token::Identifier, "user"),
                (Token::Period, "."),
                (Token::Identifier, "name"),
                (Token::Arrow, "->"),
                (Token::HelperName, "f:format.case"),
                (Token::LeftParen, "("),
                (Token::Identifier, "mode"),
                (Token::Colon, ":"),
                (Token::String, "'upper'"),
                (Token::RightParen, ")"),
                (Token::EndInterpolation, "}"),
            ]
        );
    }

    #[test]
    fn test_lex_literals() {
        assert_eq!(
            lex("{[-1, 2.5, items.0, null]}", true).unwrap(),
            vec![
                (Token::BeginInterpolation, "{"),
                (Token::LeftBracket, "["),
                (Token::Number, "-1"),
                (Token::Comma, ","),
                (Token::Number, "2.5"),
                (Token::Comma, ","),
                (Token::Identifier, "items"),
                (Token::Period, "."),
                (Token::Number, "0"),
                (Token::Comma, ","),
                (Token::Null, "null"),
                (Token::RightBracket, "]"),
                (Token::EndInterpolation, "}"),
            ]
        );
    }

    #[test]
    fn test_lex_nested_braces() {
        assert_eq!(
            lex("{a: {b: 1}}", true).unwrap(),
            vec![
                (Token::BeginInterpolation, "{"),
                (Token::Identifier, "a"),
                (Token::Colon, ":"),
                (Token::LeftBrace, "{"),
                (Token::Identifier, "b"),
                (Token::Colon, ":"),
                (Token::Number, "1"),
                (Token::RightBrace, "}"),
                (Token::EndInterpolation, "}"),
            ]
        );
    }

    #[test]
    fn test_lex_passthrough() {
        let source = "<p>{ not } <x:y/></p>";

        assert_eq!(lex(source, true).unwrap(), vec![(Token::Text, source)]);
    }

    #[test]
    fn test_lex_unknown_namespace() {
        let error = lex("<p><x:y/></p>", false).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::UnresolvedHelper);
        assert_eq!(error.offset(), Some(4));
    }

    #[test]
    fn test_lex_unterminated_string() {
        let error = lex("{'abc}", true).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Parse);
    }
}
