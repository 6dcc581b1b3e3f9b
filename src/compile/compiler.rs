//! Compilation of syntax trees to cached executables.
//!
//! Every node is turned into a [`Fragment`]. Helpers that decline compilation
//! are interpreted through their original node, which leaves the resulting
//! [`Executable`] partial. Only closed executables are stored in a [`Cache`].
use super::{
    parse::tree::{Invocation, Literal, Node},
    Cache, Template,
};
use crate::{
    helper::{fragment, Compilation, Fragment},
    pipe::to_text,
    render::{accessor::resolve_path, concatenate, RenderingContext},
    report::Error,
    value::{Map, Value},
};
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

/// An executable equivalent of walking a syntax tree.
pub struct Executable {
    identifier: String,
    fingerprint: String,
    body: Fragment,
    /// True if no part of the body falls back to interpretation.
    closed: bool,
}

impl Executable {
    /// Execute with the given [`RenderingContext`] and return the output.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] under the same conditions as interpreting the
    /// template would.
    pub fn execute(&self, context: &mut RenderingContext) -> Result<String, Error> {
        (self.body)(context).map(|value| to_text(&value))
    }

    /// Return true if the whole template was compiled.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[inline]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl Debug for Executable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executable")
            .field("identifier", &self.identifier)
            .field("fingerprint", &self.fingerprint)
            .field("closed", &self.closed)
            .finish()
    }
}

/// Walks a syntax tree and emits an [`Executable`].
pub struct Compiler {
    closed: bool,
}

impl Compiler {
    /// Compile the [`Template`].
    ///
    /// Never fails. Invocations of helpers that do not support compilation are
    /// interpreted when executed, and the [`Executable`] is marked partial.
    pub fn compile(template: &Template) -> Executable {
        let mut compiler = Self { closed: true };
        let body = compiler.compile_node(template.root());

        Executable {
            identifier: template.identifier().to_owned(),
            fingerprint: template.fingerprint().to_owned(),
            body,
            closed: compiler.closed,
        }
    }

    /// Return the cached [`Executable`] with the given identifier, unless it
    /// was compiled from a different source.
    pub fn fetch(
        cache: &dyn Cache,
        identifier: &str,
        fingerprint: &str,
    ) -> Option<Arc<Executable>> {
        let executable = cache.get(identifier)?;
        if executable.fingerprint() != fingerprint {
            log::debug!("cached executable `{identifier}` is stale");
            return None;
        }

        Some(executable)
    }

    /// Return the cached [`Executable`] for the [`Template`], compiling and
    /// storing it on a miss.
    ///
    /// A partial executable is returned but not stored.
    pub fn compile_or_fetch(cache: &dyn Cache, template: &Template) -> Arc<Executable> {
        let identifier = template.identifier();
        if let Some(executable) = Self::fetch(cache, identifier, template.fingerprint()) {
            log::debug!("cache hit for `{identifier}`");
            return executable;
        }

        let executable = Arc::new(Self::compile(template));
        if executable.is_closed() {
            log::debug!("compiled and cached `{identifier}`");
            cache.set(identifier, executable.clone());
        } else {
            log::debug!("`{identifier}` is partially compiled, not caching");
        }

        executable
    }

    fn compile_node(&mut self, node: &Node) -> Fragment {
        match node {
            Node::Text(text) => constant(Value::String(text.clone())),
            Node::ObjectAccessor(accessor) => {
                let path = accessor.path.clone();
                let region = accessor.region;

                fragment(move |context| {
                    resolve_path(context.variable_provider().as_ref(), &path)
                        .map_err(|error| error.with_region(region))
                })
            }
            Node::Literal(literal) => self.compile_literal(literal),
            Node::HelperInvocation(invocation) => self.compile_invocation(node, invocation),
            Node::Root(children) => self.compile_sequence(children, true),
        }
    }

    fn compile_literal(&mut self, literal: &Literal) -> Fragment {
        match literal {
            Literal::Null => constant(Value::Null),
            Literal::Bool(bool) => constant(Value::Bool(*bool)),
            Literal::Number(number) => constant(Value::Number(number.clone())),
            Literal::Constant(value) => constant(value.clone()),
            Literal::Array(items) => {
                let items: Vec<Fragment> =
                    items.iter().map(|item| self.compile_node(item)).collect();

                fragment(move |context| {
                    items
                        .iter()
                        .map(|item| item(context))
                        .collect::<Result<_, _>>()
                        .map(Value::Array)
                })
            }
            Literal::Map(entries) => {
                let entries: Vec<(String, Fragment)> = entries
                    .iter()
                    .map(|(key, node)| (key.clone(), self.compile_node(node)))
                    .collect();

                fragment(move |context| {
                    let mut map = Map::with_capacity(entries.len());
                    for (key, entry) in &entries {
                        map.insert(key.clone(), entry(context)?);
                    }

                    Ok(Value::Map(map))
                })
            }
        }
    }

    fn compile_invocation(&mut self, node: &Node, invocation: &Invocation) -> Fragment {
        let descriptor = invocation.descriptor.clone();
        let arguments = invocation
            .arguments
            .iter()
            .map(|(name, argument)| (name.clone(), self.compile_node(argument)))
            .collect();
        let children = self.compile_sequence(&invocation.children, descriptor.escapes_children());
        let compilation = Compilation {
            descriptor: descriptor.clone(),
            arguments,
            children,
        };

        match descriptor.helper().compile(compilation) {
            Some(compiled) => {
                let region = invocation.region;
                fragment(move |context| {
                    compiled(context).map_err(|error| error.with_region(region))
                })
            }
            None => {
                log::debug!(
                    "`{}` does not support compilation, interpreting",
                    descriptor.name()
                );
                self.closed = false;
                let node = node.clone();
                fragment(move |context| node.evaluate(context))
            }
        }
    }

    /// Compile nodes that are concatenated, keeping the escaping policy of
    /// each node.
    fn compile_sequence(&mut self, nodes: &[Node], escape: bool) -> Fragment {
        let parts: Vec<(Fragment, bool)> = nodes
            .iter()
            .map(|node| (self.compile_node(node), node.escapes()))
            .collect();

        fragment(move |context| {
            concatenate(&parts, escape, context, |(part, escapes), context| {
                Ok((part(context)?, *escapes))
            })
        })
    }
}

fn constant(value: Value) -> Fragment {
    fragment(move |_| Ok(value.clone()))
}

#[cfg(test)]
mod tests {
    use super::Compiler;
    use crate::{
        compile::{compile, parse_template, MemoryCache},
        helper::{ArgumentSchema, Arguments, Children, Helper},
        render::{render_with, RenderingContext},
        report::Error,
        resolver::Resolver,
        settings::Settings,
        value::Value,
        Store,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    /// Wraps its children in parentheses and never compiles.
    struct Interpreted;

    impl Helper for Interpreted {
        fn arguments(&self) -> ArgumentSchema {
            ArgumentSchema::new()
        }

        fn render(
            &self,
            _: &Arguments,
            children: &Children,
            context: &mut RenderingContext,
        ) -> Result<Value, Error> {
            Ok(Value::String(format!("({})", children.render_text(context)?)))
        }
    }

    fn context() -> RenderingContext {
        RenderingContext::default().with_variables(
            Store::new()
                .with_must("title", "<Fish & Chips>")
                .with_must("items", json!(["a", "b", "c"]))
                .with_must("on", true),
        )
    }

    #[test]
    fn test_compiled_matches_interpreted() {
        let source = concat!(
            "<h1>{title}</h1>",
            r#"<f:for each="{items}" as="item" iteration="i">"#,
            r#"<f:cycle values="{['odd', 'even']}" as="zebra">"#,
            r#"<li class="{zebra}">{item -> f:format.case()}{i.index}</li>"#,
            "</f:cycle></f:for>",
            r#"<f:if condition="{on}" then="{title}"/>"#,
            "<f:format.raw>{title}</f:format.raw>",
            "{[1, {a: true}, null]}",
        );
        let template = compile(source).unwrap();
        let executable = Compiler::compile(&template);

        assert!(executable.is_closed());
        assert_eq!(
            executable.execute(&mut context()).unwrap(),
            render_with(&template, &mut context()).unwrap()
        );
    }

    #[test]
    fn test_partial_compilation() {
        let resolver = Resolver::default().with_helper("t", "paren", Interpreted);
        let template = parse_template(
            "<t:paren>{title}</t:paren>",
            None,
            &resolver,
            &Settings::default(),
        )
        .unwrap();
        let executable = Compiler::compile(&template);

        assert!(!executable.is_closed());
        assert!(!template.is_compilable());
        assert_eq!(
            executable.execute(&mut context()).unwrap(),
            "(&lt;Fish &amp; Chips&gt;)"
        );
    }

    #[test]
    fn test_compile_or_fetch() {
        let cache = MemoryCache::new();
        let parse = |source: &str| {
            parse_template(source, Some("page.html"), &Resolver::default(), &Settings::default())
                .unwrap()
        };
        let template = parse("{title}");

        let first = Compiler::compile_or_fetch(&cache, &template);
        let second = Compiler::compile_or_fetch(&cache, &template);
        assert!(Arc::ptr_eq(&first, &second));

        // Same identifier, different source.
        let changed = parse("[{title}]");
        assert_eq!(changed.identifier(), template.identifier());
        assert!(Compiler::fetch(&cache, changed.identifier(), changed.fingerprint()).is_none());

        let third = Compiler::compile_or_fetch(&cache, &changed);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.execute(&mut context()).unwrap(), "[&lt;Fish &amp; Chips&gt;]");
    }

    #[test]
    fn test_partial_not_cached() {
        let cache = MemoryCache::new();
        let resolver = Resolver::default().with_helper("t", "paren", Interpreted);
        let template =
            parse_template("<t:paren/>", Some("p"), &resolver, &Settings::default()).unwrap();

        Compiler::compile_or_fetch(&cache, &template);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_compiled_error_location() {
        let template = compile("ab\n<f:for each=\"{title}\" as=\"x\"/>").unwrap();
        let error = Compiler::compile(&template)
            .execute(&mut context())
            .unwrap_err();

        assert_eq!(error.kind(), crate::ErrorKind::ArgumentType);
        assert_eq!(error.offset(), Some(4));
    }
}
