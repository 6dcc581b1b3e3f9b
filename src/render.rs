//! Interpretation of the syntax tree.
//!
//! Every [`Node`] evaluates to a [`Value`]. Sequences of nodes, such as the
//! template itself and the children of a helper, are concatenated to text with
//! each part escaped according to [`Node::escapes`].
pub mod accessor;

mod container;
mod context;
mod store;

pub use container::HelperVariableContainer;
pub use context::RenderingContext;
pub use store::{ScopedVariableProvider, Store, VariableProvider};

use crate::{
    compile::{
        tree::{Invocation, Literal, Node},
        Template,
    },
    helper::{Arguments, Children},
    pipe::{to_text, Pipe},
    report::{error_write, Error},
    value::{Map, Value},
};

/// Render a [`Template`].
///
/// Provides a shortcut to quickly render a `Template` when no advanced features
/// are needed. The template is interpreted with a fresh
/// [`RenderingContext`] holding the given variables.
///
/// You may also prefer to create an [`Engine`][`crate::Engine`] if you intend to
/// use custom helpers or cache compiled templates.
///
/// # Examples
///
/// ```
/// use vellum::{compile, render, Store};
///
/// let template = compile("hello, {name}!");
/// assert!(template.is_ok());
///
/// let output = render(&template.unwrap(), &Store::new().with_must("name", "taylor"));
/// assert_eq!(output.unwrap(), "hello, taylor!");
/// ```
pub fn render(template: &Template, store: &Store) -> Result<String, Error> {
    let mut context = RenderingContext::default().with_variables(store.clone());

    render_with(template, &mut context)
}

/// Render a [`Template`] by interpreting its syntax tree with the given
/// [`RenderingContext`].
///
/// # Errors
///
/// Returns an [`Error`] if evaluating any node fails, pointing into the
/// template source where possible.
pub fn render_with(template: &Template, context: &mut RenderingContext) -> Result<String, Error> {
    template
        .root()
        .evaluate(context)
        .map(|value| to_text(&value))
        .map_err(|error| template.locate(error))
}

impl Node {
    /// Evaluate this node.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if an accessor reaches an inaccessible property,
    /// an argument has the wrong type, or a helper fails.
    pub fn evaluate(&self, context: &mut RenderingContext) -> Result<Value, Error> {
        match self {
            Node::Text(text) => Ok(Value::String(text.clone())),
            Node::ObjectAccessor(accessor) => {
                accessor::resolve_path(context.variable_provider().as_ref(), &accessor.path)
                    .map_err(|error| error.with_region(accessor.region))
            }
            Node::Literal(literal) => evaluate_literal(literal, context),
            Node::HelperInvocation(invocation) => evaluate_invocation(invocation, context)
                .map_err(|error| error.with_region(invocation.region)),
            Node::Root(children) => concatenate_nodes(children, true, context),
        }
    }
}

fn evaluate_literal(literal: &Literal, context: &mut RenderingContext) -> Result<Value, Error> {
    Ok(match literal {
        Literal::Null => Value::Null,
        Literal::Bool(bool) => Value::Bool(*bool),
        Literal::Number(number) => Value::Number(number.clone()),
        Literal::Constant(value) => value.clone(),
        Literal::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| item.evaluate(context))
                .collect::<Result<_, _>>()?,
        ),
        Literal::Map(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, node) in entries {
                map.insert(key.clone(), node.evaluate(context)?);
            }

            Value::Map(map)
        }
    })
}

fn evaluate_invocation(
    invocation: &Invocation,
    context: &mut RenderingContext,
) -> Result<Value, Error> {
    let mut arguments = Arguments::new();
    for (name, node) in &invocation.arguments {
        arguments.insert(name.as_str(), node.evaluate(context)?);
    }

    let escape = invocation.descriptor.escapes_children();
    let children =
        Children::new(|context| concatenate_nodes(&invocation.children, escape, context));

    invocation.descriptor.invoke(arguments, &children, context)
}

/// Evaluate the nodes and concatenate their text.
pub(crate) fn concatenate_nodes(
    nodes: &[Node],
    escape: bool,
    context: &mut RenderingContext,
) -> Result<Value, Error> {
    concatenate(nodes, escape, context, |node, context| {
        Ok((node.evaluate(context)?, node.escapes()))
    })
}

/// Evaluate each part and concatenate their text.
///
/// A part is escaped when the sequence is escaped, the part asks for it and
/// output escaping is enabled in the settings. Interpreted and compiled
/// templates both concatenate through here.
pub(crate) fn concatenate<T, F>(
    parts: &[T],
    escape: bool,
    context: &mut RenderingContext,
    evaluate: F,
) -> Result<Value, Error>
where
    F: Fn(&T, &mut RenderingContext) -> Result<(Value, bool), Error>,
{
    let escape = escape && context.settings().escape_output;
    let mut buffer = String::new();
    let mut pipe = Pipe::new(&mut buffer);

    for part in parts {
        let (value, escapes) = evaluate(part, context)?;
        pipe.write_value(&value, escape && escapes)
            .map_err(|_| error_write())?;
    }

    Ok(Value::String(buffer))
}

#[cfg(test)]
mod tests {
    use super::{render, render_with, RenderingContext, Store};
    use crate::{
        compile::compile,
        report::ErrorKind,
        settings::Settings,
        value::{Object, Property, Value},
        Engine,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn render_source(source: &str, store: Store) -> String {
        render(&compile(source).unwrap(), &store).unwrap()
    }

    #[test]
    fn test_text_passes_through() {
        let source = "<div class=\"a\">Plain & simple, { not an expression }</div>";

        assert_eq!(render_source(source, Store::new()), source);
    }

    #[test]
    fn test_accessor_is_escaped() {
        let store = Store::new().with_must("name", "<b>Tom & Jerry</b>");

        assert_eq!(
            render_source("<p>{name}</p>", store),
            "<p>&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;</p>"
        );
    }

    #[test]
    fn test_escaping_disabled() {
        let engine = Engine::new(Settings::default().with_escape_output(false));
        let template = engine.compile("{name}").unwrap();
        let store = Store::new().with_must("name", "<b>");

        assert_eq!(engine.render(&template, &store).unwrap(), "<b>");
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            render_source("{[1, 'two', true, null]} {-2.5} {{a: 1}}", Store::new()),
            "[1, two, true, ] -2.5 {a: 1}"
        );
    }

    #[test]
    fn test_inline_style_and_script_pass_through() {
        let source = "<style>p{color:red}</style><script>if(a){return b;}</script>";
        let store = Store::new().with_must("name", "x");

        assert_eq!(render_source(&format!("{source}{{name}}"), store), format!("{source}x"));
    }

    #[test]
    fn test_for_and_if() {
        let source = concat!(
            r#"<f:for each="{users}" as="user" iteration="it">"#,
            r#"<f:if condition="{it.isFirst}" else=", ">"#,
            r#"</f:if>{user.name}"#,
            r#"</f:for>"#,
        );
        let store = Store::new().with_must(
            "users",
            json!([{"name": "Taylor"}, {"name": "Casey"}, {"name": "Robin"}]),
        );

        assert_eq!(render_source(source, store), "Taylor, Casey, Robin");
    }

    #[test]
    fn test_inline_helper() {
        let store = Store::new().with_must("name", "taylor");

        assert_eq!(
            render_source("{name -> f:format.case(mode: 'capital')}", store),
            "Taylor"
        );
    }

    #[test]
    fn test_raw_output() {
        let store = Store::new().with_must("html", "<em>hi</em>");

        assert_eq!(
            render_source("<f:format.raw>{html}</f:format.raw>", store.clone()),
            "<em>hi</em>"
        );
        assert_eq!(
            render_source(r#"<f:format.raw value="{html}"/>"#, store),
            "<em>hi</em>"
        );
    }

    #[test]
    fn test_missing_variable_is_empty() {
        assert_eq!(render_source("[{missing.deeply.nested}]", Store::new()), "[]");
    }

    #[derive(Debug)]
    struct Account;

    impl Object for Account {
        fn property(&self, name: &str) -> Property {
            match name {
                "password" => Property::Restricted,
                _ => Property::Missing,
            }
        }
    }

    #[test]
    fn test_inaccessible_property_points_at_accessor() {
        let template = compile("Hello\n{account.password}").unwrap();
        let mut context =
            RenderingContext::default().with_variables(Store::new().with_object("account", Account));
        let error = render_with(&template, &mut context).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InaccessibleProperty);
        assert_eq!(error.offset(), Some(7));
        assert!(format!("{error:#}").contains("2:2"));
    }

    #[test]
    fn test_argument_type_error() {
        let store = Store::new().with_must("name", "not a list");
        let template = compile(r#"<f:for each="{name}" as="x">{x}</f:for>"#).unwrap();
        let error = render(&template, &store).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ArgumentType);
    }

    #[test]
    fn test_scoped_variables_do_not_leak() {
        let store = Store::new().with_must("x", "outer");
        let source = r#"<f:alias map="{x: 'inner'}">{x}</f:alias>{x}"#;

        assert_eq!(render_source(source, store), "innerouter");
    }

    #[test]
    fn test_values_shared_between_renders() {
        let provider = Arc::new(Store::new().with_value("n", 1_i64));
        let mut context = RenderingContext::default();
        context.set_variable_provider(provider.clone());
        let template = compile("{n}").unwrap();

        assert_eq!(render_with(&template, &mut context).unwrap(), "1");
        assert_eq!(provider.get("n"), Some(&Value::from(1_i64)));
    }
}
