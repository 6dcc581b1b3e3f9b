//! Vellum parser.
//!
//! Utilizes a Lexer to receive instances of Region, which it uses to construct
//! a new Template containing the syntax tree. Helper names are resolved and
//! their arguments checked while parsing, so a Template that parses is ready
//! to render.
pub mod tree;

mod state;

use self::{
    state::{Argument, OpenTag},
    tree::{Accessor, Invocation, Literal, Node},
};
use super::{
    lex::{token::Token, LexResult, Lexer},
    template::Template,
};
use crate::{
    region::Region,
    report::{
        deprecated, error_eof, Deprecation, Error, ErrorKind, INVALID_SYNTAX, UNEXPECTED_CLOSE,
        UNEXPECTED_EOF, UNEXPECTED_TOKEN,
    },
    resolver::Resolver,
    settings::Settings,
};
use indexmap::IndexMap;
use morel::Finder;
use serde_json::Number;
use std::collections::VecDeque;

/// Result of reading a [`Token`] that must be present.
type LexResultMust = Result<(Token, Region), Error>;

pub struct Parser<'source> {
    /// The whole template source.
    source: &'source str,
    /// Lexer used to pull from source as tokens instead of raw text.
    lexer: Lexer<'source>,
    /// Store peeked tokens.
    buffer: VecDeque<(Token, Region)>,
    finder: &'source Finder,
    resolver: &'source Resolver,
    settings: &'source Settings,
    /// Name of the template, used in deprecation notices.
    name: Option<&'source str>,
    /// When true, braces in text that do not hold an expression are text.
    fallback: bool,
}

impl<'source> Parser<'source> {
    /// Create a new Parser over the given source.
    #[inline]
    pub fn new(
        source: &'source str,
        finder: &'source Finder,
        resolver: &'source Resolver,
        settings: &'source Settings,
    ) -> Self {
        Self {
            source,
            lexer: Lexer::new(
                source,
                finder,
                resolver,
                settings.passthrough_unknown_namespaces,
            ),
            buffer: VecDeque::new(),
            finder,
            resolver,
            settings,
            name: None,
            fallback: true,
        }
    }

    /// Create a Parser over an attribute value within the source.
    fn fragment(&self, region: Region) -> Self {
        Self {
            lexer: Lexer::fragment(
                self.source,
                region,
                self.finder,
                self.resolver,
                self.settings.passthrough_unknown_namespaces,
            ),
            buffer: VecDeque::new(),
            fallback: false,
            ..*self
        }
    }

    /// Compile the template.
    ///
    /// Returns a new Template, which can be rendered with a
    /// [`RenderingContext`][`crate::render::RenderingContext`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the source is malformed, names an unknown
    /// helper, or invokes a helper with invalid arguments.
    pub fn compile(mut self, name: Option<&'source str>) -> Result<Template, Error> {
        self.name = name;
        let nodes = self.parse_nodes().map_err(|error| match name {
            Some(name) => error.with_name(name),
            None => error,
        })?;

        Ok(Template::new(
            name,
            self.source,
            Node::Root(nodes),
            self.resolver.signature(),
        ))
    }

    /// Parse every remaining token into a sequence of nodes.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a tag is closed out of order, or left open.
    fn parse_nodes(&mut self) -> Result<Vec<Node>, Error> {
        let source = self.source;
        let mut open: Vec<OpenTag> = vec![];
        let mut nodes: Vec<Node> = vec![];

        while let Some((token, region)) = self.next()? {
            let node = match token {
                Token::Text => Node::Text(region.literal(source).to_string()),
                Token::BeginInterpolation if self.fallback => {
                    match self.parse_text_interpolation(region)? {
                        Some(node) => node,
                        None => Node::Text(region.literal(source).to_string()),
                    }
                }
                Token::BeginInterpolation => self.parse_interpolation()?,
                Token::TagOpen => {
                    let arguments = self.parse_attributes()?;
                    let (end, _) = self.next_any_must()?;
                    if end == Token::TagEnd {
                        open.push(OpenTag::new(region, arguments));
                        continue;
                    }

                    self.invoke(region, arguments, vec![])?
                }
                Token::TagClose => {
                    let Some(tag) = open.pop() else {
                        return Err(Error::of(ErrorKind::Parse, UNEXPECTED_CLOSE)
                            .with_pointer(source, region)
                            .with_help(format!(
                                "`</{}>` does not close any open tag",
                                &source[region]
                            )));
                    };
                    if source[tag.name] != source[region] {
                        return Err(Error::of(ErrorKind::Parse, UNEXPECTED_CLOSE)
                            .with_pointer(source, region)
                            .with_help(format!(
                                "expected `</{}>` to close the tag opened on line {}",
                                &source[tag.name],
                                tag.name.line(source)
                            )));
                    }

                    self.invoke(tag.name, tag.arguments, tag.children)?
                }
                _ => {
                    return Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                        .with_pointer(source, region)
                        .with_help(format!("unexpected {token} outside of a tag")));
                }
            };

            match open.last_mut() {
                Some(tag) => push_node(&mut tag.children, node),
                None => push_node(&mut nodes, node),
            }
        }

        if let Some(tag) = open.last() {
            let name = &source[tag.name];
            return Err(Error::of(ErrorKind::Parse, INVALID_SYNTAX)
                .with_pointer(source, tag.name)
                .with_help(format!("did you close `<{name}>` with `</{name}>`?")));
        }

        Ok(nodes)
    }

    /// Parse the attributes of an opening tag, up to but not including the
    /// `>` or `/>` that ends it.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when an attribute is malformed or repeated.
    fn parse_attributes(&mut self) -> Result<Vec<Argument>, Error> {
        let mut arguments = vec![];

        loop {
            match self.peek()? {
                Some((Token::TagEnd | Token::TagSelfClose, _)) => return Ok(arguments),
                Some((Token::AttributeName, region)) => {
                    self.next()?;
                    self.next_must(Token::Assign)?;
                    let (_, value) = self.next_must(Token::AttributeValue)?;
                    let value = self.parse_attribute_value(value)?;
                    self.push_argument(&mut arguments, region, value)?;
                }
                Some((token, region)) => {
                    return Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                        .with_pointer(self.source, region)
                        .with_help(format!(
                            "expected an attribute, `>` or `/>`, found {token}"
                        )));
                }
                None => return Err(error_eof(self.source)),
            }
        }
    }

    /// Parse the content of an attribute value.
    ///
    /// A value that is a single interpolation becomes that expression, plain
    /// text becomes [`Node::Text`] and anything else a [`Node::Root`].
    fn parse_attribute_value(&self, region: Region) -> Result<Node, Error> {
        let mut nodes = self.fragment(region).parse_nodes()?;

        Ok(match nodes.len() {
            0 => Node::Text(String::new()),
            1 => nodes.remove(0),
            _ => Node::Root(nodes),
        })
    }

    /// Parse an interpolation opened by `open` in text.
    ///
    /// Returns `None` when the braces hold `key: value` pairs or anything that
    /// is not a complete expression, such as a CSS rule or a JavaScript block,
    /// and the lexer is rewound to read them as text. An interpolation that
    /// is never closed is still an error.
    fn parse_text_interpolation(&mut self, open: Region) -> Result<Option<Node>, Error> {
        let attempt = match self.is_keyed() {
            Ok(true) => None,
            Ok(false) => Some(self.parse_interpolation()),
            Err(error) => Some(Err(error)),
        };
        match attempt {
            Some(Ok(node)) => return Ok(Some(node)),
            Some(Err(error)) if error.kind() != ErrorKind::Parse => return Err(error),
            Some(Err(error)) if error.reason() == UNEXPECTED_EOF => return Err(error),
            _ => {}
        }

        self.buffer.clear();
        self.lexer.rewind(open);
        Ok(None)
    }

    /// Return true if the upcoming tokens begin a `key: value` pair.
    fn is_keyed(&mut self) -> Result<bool, Error> {
        Ok(matches!(
            self.peek()?,
            Some((Token::Identifier | Token::Number | Token::String, _))
        ) && matches!(self.peek_nth(1)?, Some((Token::Colon, _))))
    }

    /// Parse the content of an interpolation, including the closing `}`.
    ///
    /// A body of `key: value` pairs is a map literal.
    fn parse_interpolation(&mut self) -> Result<Node, Error> {
        if self.is_keyed()? {
            let entries = self.parse_map_entries(Token::EndInterpolation)?;

            return Ok(Node::Literal(Literal::Map(entries)));
        }

        let node = self.parse_expression()?;
        self.next_must(Token::EndInterpolation)?;

        Ok(node)
    }

    /// Parse an expression, followed by any number of `-> ns:helper()` calls
    /// that each receive the expression before it as their only child.
    fn parse_expression(&mut self) -> Result<Node, Error> {
        let mut node = self.parse_primary()?;

        while self.next_is(Token::Arrow)? {
            self.next()?;
            let (_, name) = self.next_must(Token::HelperName)?;
            node = self.parse_inline_helper(name, Some(node))?;
        }

        Ok(node)
    }

    /// Parse a single accessor, literal or inline helper call.
    fn parse_primary(&mut self) -> Result<Node, Error> {
        let (token, region) = self.next_any_must()?;
        let literal = region.literal(self.source);

        let node = match token {
            Token::Identifier => self.parse_accessor(region)?,
            Token::True => Node::Literal(Literal::Bool(true)),
            Token::False => Node::Literal(Literal::Bool(false)),
            Token::Null => Node::Literal(Literal::Null),
            Token::Number => Node::Literal(Literal::Number(
                literal.parse::<Number>().map_err(|_| {
                    Error::of(ErrorKind::Parse, INVALID_SYNTAX)
                        .with_pointer(self.source, region)
                        .with_help(format!("`{literal}` is not a valid number"))
                })?,
            )),
            Token::String => Node::Text(unescape(literal)),
            Token::LeftBracket => self.parse_list()?,
            Token::LeftBrace => Node::Literal(Literal::Map(
                self.parse_map_entries(Token::RightBrace)?,
            )),
            Token::HelperName => self.parse_inline_helper(region, None)?,
            _ => {
                return Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                    .with_pointer(self.source, region)
                    .with_help(format!(
                        "expected an identifier, a literal or a helper call, found {token}"
                    )));
            }
        };

        Ok(node)
    }

    /// Parse the remaining segments of an accessor that begins at `region`.
    fn parse_accessor(&mut self, region: Region) -> Result<Node, Error> {
        let mut path = vec![region.literal(self.source).to_string()];
        let mut whole = region;

        while self.next_is(Token::Period)? {
            self.next()?;
            let (token, segment) = self.next_any_must()?;
            match token {
                Token::Identifier | Token::Number | Token::True | Token::False | Token::Null => {
                    path.push(segment.literal(self.source).to_string());
                    whole = whole.combine(segment);
                }
                _ => {
                    return Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                        .with_pointer(self.source, segment)
                        .with_help("expected a property name or index after `.`"));
                }
            }
        }

        Ok(Node::ObjectAccessor(Accessor {
            path,
            region: whole,
        }))
    }

    /// Parse the items of a list literal, including the closing `]`.
    fn parse_list(&mut self) -> Result<Node, Error> {
        let mut items = vec![];

        loop {
            if self.next_is(Token::RightBracket)? {
                self.next()?;
                break;
            }
            items.push(self.parse_expression()?);

            match self.next_any_must()? {
                (Token::Comma, _) => continue,
                (Token::RightBracket, _) => break,
                (_, region) => {
                    return Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                        .with_pointer(self.source, region)
                        .with_help("expected `,` or `]`"));
                }
            }
        }

        Ok(Node::Literal(Literal::Array(items)))
    }

    /// Parse `key: value` pairs up to and including the given end token.
    fn parse_map_entries(&mut self, end: Token) -> Result<Vec<(String, Node)>, Error> {
        let mut entries = vec![];

        loop {
            let (token, region) = self.next_any_must()?;
            if token == end {
                break;
            }
            let key = match token {
                Token::Identifier | Token::Number | Token::True | Token::False | Token::Null => {
                    region.literal(self.source).to_string()
                }
                Token::String => unescape(region.literal(self.source)),
                _ => {
                    return Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                        .with_pointer(self.source, region)
                        .with_help(format!("expected a map key or {end}, found {token}")));
                }
            };
            self.next_must(Token::Colon)?;
            entries.push((key, self.parse_expression()?));

            let (token, region) = self.next_any_must()?;
            if token == end {
                break;
            }
            if token != Token::Comma {
                return Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                    .with_pointer(self.source, region)
                    .with_help(format!("expected `,` or {end}")));
            }
        }

        Ok(entries)
    }

    /// Parse the argument list of an inline helper call named at `name`.
    ///
    /// The subject of a `->` call becomes the only child of the helper.
    fn parse_inline_helper(&mut self, name: Region, subject: Option<Node>) -> Result<Node, Error> {
        self.next_must(Token::LeftParen)?;
        let mut arguments = vec![];

        loop {
            match self.next_any_must()? {
                (Token::RightParen, _) => break,
                (Token::Identifier, region) => {
                    self.next_must(Token::Colon)?;
                    let value = self.parse_expression()?;
                    self.push_argument(&mut arguments, region, value)?;

                    match self.next_any_must()? {
                        (Token::Comma, _) => continue,
                        (Token::RightParen, _) => break,
                        (_, region) => {
                            return Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                                .with_pointer(self.source, region)
                                .with_help("expected `,` or `)`"));
                        }
                    }
                }
                (_, region) => {
                    return Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                        .with_pointer(self.source, region)
                        .with_help("expected an argument name or `)`"));
                }
            }
        }

        self.invoke(name, arguments, subject.into_iter().collect())
    }

    /// Append an argument, rejecting a name that was already given.
    fn push_argument(
        &self,
        arguments: &mut Vec<Argument>,
        region: Region,
        value: Node,
    ) -> Result<(), Error> {
        let name = region.literal(self.source);
        if arguments.iter().any(|argument| argument.name == name) {
            return Err(Error::of(ErrorKind::Parse, INVALID_SYNTAX)
                .with_pointer(self.source, region)
                .with_help(format!("argument `{name}` is given more than once")));
        }
        arguments.push(Argument {
            name: name.to_string(),
            region,
            value,
        });

        Ok(())
    }

    /// Resolve the helper named at `name` and bind the arguments to its
    /// declarations, filling in defaults of omitted optional arguments.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the helper is unknown or misconfigured, a
    /// required argument is missing, or an undeclared argument is given.
    fn invoke(
        &self,
        name: Region,
        arguments: Vec<Argument>,
        children: Vec<Node>,
    ) -> Result<Node, Error> {
        let source = self.source;
        let full = &source[name];
        let (namespace, local) = full.split_once(':').unwrap_or(("", full));
        let descriptor = self
            .resolver
            .resolve(namespace, local)
            .map_err(|error| error.with_pointer(source, name))?;
        let schema = descriptor.schema();

        if let Some(message) = schema.deprecation() {
            deprecated(Deprecation::new(
                self.name.unwrap_or("template"),
                name.line(source),
                format!("`{full}` is deprecated: {message}"),
            ));
        }

        let supplied: Vec<&str> = arguments.iter().map(|a| a.name.as_str()).collect();
        if let Err(error) = schema.check(&supplied) {
            let region = arguments
                .iter()
                .find(|a| schema.get(&a.name).is_none() && !schema.allows_arbitrary())
                .map_or(name, |a| a.region);

            return Err(error
                .with_reason(format!("invalid arguments for `{full}`"))
                .with_pointer(source, region));
        }

        let mut bound: IndexMap<String, Node> = arguments
            .into_iter()
            .map(|argument| (argument.name, argument.value))
            .collect();
        for definition in schema.definitions() {
            if let Some(default) = definition.default_value() {
                if !bound.contains_key(definition.name()) {
                    bound.insert(
                        definition.name().to_string(),
                        Node::Literal(Literal::Constant(default.clone())),
                    );
                }
            }
        }

        Ok(Node::HelperInvocation(Invocation {
            namespace: namespace.to_string(),
            name: local.to_string(),
            descriptor,
            arguments: bound,
            children,
            region: name,
        }))
    }

    /// Peek the next token.
    ///
    /// # Errors
    ///
    /// Propagates any error reported by the underlying Lexer.
    fn peek(&mut self) -> LexResult {
        self.peek_nth(0)
    }

    /// Peek the token `n` positions ahead of the next one.
    fn peek_nth(&mut self, n: usize) -> LexResult {
        while self.buffer.len() <= n {
            match self.lexer.next()? {
                Some(next) => self.buffer.push_back(next),
                None => return Ok(None),
            }
        }

        Ok(self.buffer.get(n).copied())
    }

    /// Get the next token.
    ///
    /// Prefers to pull a token from the internal buffer first, but will pull from
    /// the lexer when the buffer is empty.
    fn next(&mut self) -> LexResult {
        match self.buffer.pop_front() {
            Some(next) => Ok(Some(next)),
            None => self.lexer.next(),
        }
    }

    /// Returns true if the given token matches the upcoming token.
    ///
    /// # Errors
    ///
    /// Propagates any errors reported by the underlying lexer.
    fn next_is(&mut self, expect: Token) -> Result<bool, Error> {
        Ok(self.peek()?.is_some_and(|(token, _)| token == expect))
    }

    /// Get the next token, and compare it to the given token.
    ///
    /// # Errors
    ///
    /// An error is returned if the next token does not match the given token,
    /// or when [next()] returns None.
    fn next_must(&mut self, expect: Token) -> LexResultMust {
        match self.next()? {
            Some((token, region)) if token == expect => Ok((token, region)),
            Some((token, region)) => Err(Error::of(ErrorKind::Parse, UNEXPECTED_TOKEN)
                .with_pointer(self.source, region)
                .with_help(format!("expected {expect}, found {token}"))),
            None => Err(error_eof(self.source).with_help(format!("expected {expect}"))),
        }
    }

    /// Get the next token.
    ///
    /// Similar to "next()" but requires that a token is returned.
    ///
    /// # Errors
    ///
    /// An error is returned if no more tokens are left.
    fn next_any_must(&mut self) -> LexResultMust {
        match self.next()? {
            Some(next) => Ok(next),
            None => Err(error_eof(self.source)),
        }
    }
}

/// Append a node, joining it to the previous node when both are text.
fn push_node(nodes: &mut Vec<Node>, node: Node) {
    if let (Some(Node::Text(previous)), Node::Text(text)) = (nodes.last_mut(), &node) {
        previous.push_str(text);
        return;
    }

    nodes.push(node);
}

/// Return the content of a quoted string literal with escapes resolved.
fn unescape(literal: &str) -> String {
    let inner = literal
        .get(1..literal.len().saturating_sub(1))
        .unwrap_or_default();
    let mut text = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(char) = chars.next() {
        if char != '\\' {
            text.push(char);
            continue;
        }
        match chars.next() {
            Some(escaped @ ('\'' | '"' | '\\')) => text.push(escaped),
            Some(other) => {
                text.push('\\');
                text.push(other);
            }
            None => text.push('\\'),
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::{
        tree::{Literal, Node},
        unescape,
    };
    use crate::{
        compile::parse_template,
        helper::{ArgumentSchema, Arguments, Children, Helper},
        render::RenderingContext,
        report::{capture, Error, ErrorKind},
        resolver::Resolver,
        settings::Settings,
        value::Value,
    };
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<Vec<Node>, Error> {
        parse_template(source, None, &Resolver::default(), &Settings::default())
            .map(|template| template.root().children().to_vec())
    }

    fn invocation(node: &Node) -> &super::tree::Invocation {
        match node {
            Node::HelperInvocation(invocation) => invocation,
            other => panic!("expected a helper invocation, found {other:?}"),
        }
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(
            parse("<p>plain { text }</p>").unwrap(),
            vec![Node::Text("<p>plain { text }</p>".to_string())]
        );
    }

    #[test]
    fn test_parse_accessor() {
        let nodes = parse("Hello {user.name}!").unwrap();

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0], Node::Text("Hello ".to_string()));
        let Node::ObjectAccessor(accessor) = &nodes[1] else {
            panic!("expected an accessor");
        };
        assert_eq!(accessor.path, vec!["user", "name"]);
        assert_eq!(accessor.region, (7..16).into());
        assert_eq!(nodes[2], Node::Text("!".to_string()));
    }

    #[test]
    fn test_parse_tag_with_children() {
        let nodes = parse(r#"<f:if condition="{show}">yes</f:if>"#).unwrap();
        let invocation = invocation(&nodes[0]);

        assert_eq!(invocation.namespace, "f");
        assert_eq!(invocation.name, "if");
        assert_eq!(invocation.children, vec![Node::Text("yes".to_string())]);
        assert!(matches!(
            invocation.arguments.get("condition"),
            Some(Node::ObjectAccessor(_))
        ));
        assert_eq!(
            invocation.arguments.get("else"),
            Some(&Node::Literal(Literal::Constant(Value::Null)))
        );
    }

    #[test]
    fn test_parse_mixed_attribute() {
        let nodes = parse(r#"<f:format.raw value="a {b}"/>"#).unwrap();
        let invocation = invocation(&nodes[0]);

        let Some(Node::Root(parts)) = invocation.arguments.get("value") else {
            panic!("expected a root node");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], Node::Text("a ".to_string()));
    }

    #[test]
    fn test_parse_map_literal() {
        let nodes = parse(r#"<f:alias map="{0: 'odd', 1: 'even'}"/>{{a: "b"}}"#).unwrap();
        let expected = Literal::Map(vec![
            ("0".to_string(), Node::Text("odd".to_string())),
            ("1".to_string(), Node::Text("even".to_string())),
        ]);

        assert_eq!(
            invocation(&nodes[0]).arguments.get("map"),
            Some(&Node::Literal(expected))
        );
        assert_eq!(
            nodes[1],
            Node::Literal(Literal::Map(vec![(
                "a".to_string(),
                Node::Text("b".to_string())
            )]))
        );
    }

    #[test]
    fn test_parse_braces_in_style_and_script_are_text() {
        for source in [
            "<style>p{color:red}</style>",
            "<style>.a{display:none;margin:0}</style>",
            "<script>if(a){return b;}</script>",
            "<script>var o = {a: 1};</script>",
            "{0: 'odd'}",
        ] {
            assert_eq!(parse(source).unwrap(), vec![Node::Text(source.to_string())]);
        }

        let nodes = parse("<style>p{color:red}</style>{name}").unwrap();
        assert_eq!(nodes[0], Node::Text("<style>p{color:red}</style>".to_string()));
        assert!(matches!(nodes[1], Node::ObjectAccessor(_)));
    }

    #[test]
    fn test_parse_inline_helper() {
        let nodes = parse("{name -> f:format.case(mode: 'upper')}").unwrap();
        let invocation = invocation(&nodes[0]);

        assert_eq!(invocation.name, "format.case");
        assert_eq!(
            invocation.arguments.get("mode"),
            Some(&Node::Text("upper".to_string()))
        );
        assert!(matches!(invocation.children[0], Node::ObjectAccessor(_)));
    }

    #[test]
    fn test_parse_mismatched_close() {
        let error = parse(r#"<f:if condition="1"><f:alias map="{}"></f:if></f:alias>"#)
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Parse);
        assert!(error.help().unwrap().contains("</f:alias>"));
    }

    #[test]
    fn test_parse_unclosed_tag() {
        let error = parse(r#"<f:if condition="1">open"#).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Parse);
        assert_eq!(error.offset(), Some(1));
    }

    #[test]
    fn test_parse_unterminated_interpolation() {
        let error = parse("Hello {name").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Parse);

        let error = parse("<style>p{color:red</style>{user.name").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_parse_missing_required_argument() {
        let error = parse(r#"<f:cycle values="{x}">a</f:cycle>"#).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Argument);
        assert!(error.help().unwrap().contains("missing required `as`"));
    }

    #[test]
    fn test_parse_undeclared_argument() {
        let error = parse(r#"<f:cycle as="x" extra="1">a</f:cycle>"#).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Argument);
        assert!(error.help().unwrap().contains("unknown `extra`"));
        assert_eq!(error.offset(), Some(16));
    }

    #[test]
    fn test_parse_unknown_helper() {
        let error = parse("<f:nope/>").unwrap_err();

        assert_eq!(error.kind(), ErrorKind::UnresolvedHelper);
    }

    #[test]
    fn test_parse_duplicate_attribute() {
        let error = parse(r#"<f:cycle as="x" as="y"/>"#).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Parse);
    }

    #[derive(Debug)]
    struct Legacy;

    impl Helper for Legacy {
        fn arguments(&self) -> ArgumentSchema {
            ArgumentSchema::new().with_deprecation("use f:format.raw instead")
        }

        fn render(
            &self,
            _: &Arguments,
            children: &Children,
            context: &mut RenderingContext,
        ) -> Result<Value, Error> {
            children.render(context)
        }
    }

    #[test]
    fn test_parse_raises_deprecation() {
        let resolver = Resolver::default().with_helper("t", "legacy", Legacy);
        let (result, notices) = capture(|| {
            parse_template(
                "line\n<t:legacy/>",
                Some("page.html"),
                &resolver,
                &Settings::default(),
            )
        });

        assert!(result.is_ok());
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].file, "page.html");
        assert_eq!(notices[0].line, 2);
        assert!(notices[0].message.contains("t:legacy"));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#"'it\'s'"#), "it's");
        assert_eq!(unescape(r#""a\\b\n""#), "a\\b\\n");
    }
}
