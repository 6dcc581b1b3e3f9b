//! The helper protocol.
//!
//! Helpers are the extension point of the template language. A helper is
//! invoked by a namespaced tag such as `<f:for each="{items}" as="item">` or an
//! inline call such as `{name -> f:format.case(mode: 'upper')}`, and produces a
//! [`Value`] from its evaluated [`Arguments`] and its [`Children`].
//!
//! Built-in helpers live in the `f` namespace of [`Resolver::default`][`crate::Resolver`].
mod control;
mod cycle;
mod format;
mod schema;

pub use control::{AliasHelper, ForHelper, IfHelper};
pub use cycle::CycleHelper;
pub use format::{CaseHelper, RawHelper};
pub use schema::{ArgumentDefinition, ArgumentSchema, ArgumentType, DefaultValue};

use crate::{
    pipe::to_text,
    render::RenderingContext,
    report::{Error, ErrorKind, INVALID_ARGUMENT_TYPE, INVALID_CONFIGURATION},
    value::Value,
};
use indexmap::IndexMap;
use std::{
    any::{type_name, TypeId},
    fmt::{Debug, Formatter},
    sync::Arc,
};

/// A compiled, reusable piece of rendering logic.
pub type Fragment = Arc<dyn Fn(&mut RenderingContext) -> Result<Value, Error> + Send + Sync>;

/// Create a [`Fragment`] from the given closure.
pub fn fragment<F>(render: F) -> Fragment
where
    F: Fn(&mut RenderingContext) -> Result<Value, Error> + Send + Sync + 'static,
{
    Arc::new(render)
}

/// Identity of a helper type.
///
/// Keys per-helper state in the
/// [`HelperVariableContainer`][`crate::render::HelperVariableContainer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HelperId {
    type_id: TypeId,
    name: &'static str,
}

impl HelperId {
    /// Return the [`HelperId`] of the given type.
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Return the name of the type.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Where a helper takes its content from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentPolicy {
    /// Content is the rendered children.
    Children,
    /// Content is the named argument when it is supplied and not empty,
    /// otherwise the rendered children.
    ///
    /// With `None`, the first declared optional argument is used, and the
    /// helper must declare at least one.
    Argument(Option<&'static str>),
}

/// Describes a type that can be invoked from a template.
///
/// # Examples
///
/// ```
/// use vellum::{
///     helper::{ArgumentSchema, ArgumentType, Arguments, Children, Helper},
///     render::RenderingContext,
///     Engine, Error, Store, Value,
/// };
///
/// struct Repeat;
///
/// impl Helper for Repeat {
///     fn arguments(&self) -> ArgumentSchema {
///         ArgumentSchema::new().with_required("times", ArgumentType::Number, "Repetitions")
///     }
///
///     fn render(
///         &self,
///         arguments: &Arguments,
///         children: &Children,
///         context: &mut RenderingContext,
///     ) -> Result<Value, Error> {
///         let times = arguments.value("times").as_u64().unwrap_or(0) as usize;
///
///         Ok(Value::String(children.render_text(context)?.repeat(times)))
///     }
/// }
///
/// let engine = Engine::default().with_helper("x", "repeat", Repeat);
/// let template = engine.compile(r#"<x:repeat times="3">ab</x:repeat>"#).unwrap();
///
/// assert_eq!(engine.render(&template, &Store::new()).unwrap(), "ababab");
/// ```
pub trait Helper: Send + Sync + 'static {
    /// Declare the arguments accepted by this helper.
    ///
    /// Called once per registration.
    fn arguments(&self) -> ArgumentSchema;

    /// Produce the output of this helper.
    ///
    /// Arguments are evaluated, checked against their declared types and
    /// include defaults of omitted optional arguments.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if rendering fails.
    fn render(
        &self,
        arguments: &Arguments,
        children: &Children<'_>,
        context: &mut RenderingContext,
    ) -> Result<Value, Error>;

    /// Produce a [`Fragment`] for compiled templates.
    ///
    /// Returning `None` leaves this invocation to the interpreter. Most helpers
    /// opt in with [`Compilation::render_static`].
    fn compile(&self, compilation: Compilation) -> Option<Fragment> {
        let _ = compilation;
        None
    }

    /// Where the content of this helper comes from.
    fn content(&self) -> ContentPolicy {
        ContentPolicy::Children
    }

    /// Return true if the output of this helper is escaped.
    fn escape_output(&self) -> bool {
        true
    }

    /// Return true if the children of this helper are escaped.
    ///
    /// Ignored when [`Helper::escape_output`] is true, since the output is then
    /// escaped as a whole.
    fn escape_children(&self) -> bool {
        true
    }

    /// Return the identity of this helper.
    fn id(&self) -> HelperId {
        HelperId::of::<Self>()
    }
}

/// Evaluated arguments of a helper invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, Value>,
}

/// Returned when an argument is not present.
static NULL: Value = Value::Null;

impl Arguments {
    /// Create an empty [`Arguments`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the value of an argument.
    pub fn insert<N>(&mut self, name: N, value: Value)
    where
        N: Into<String>,
    {
        self.values.insert(name.into(), value);
    }

    /// Return the value of the named argument, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Return the value of the named argument, or [`Value::Null`].
    pub fn value(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&NULL)
    }

    /// Return the text of the named argument, empty when absent.
    pub fn text(&self, name: &str) -> String {
        to_text(self.value(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

impl FromIterator<(String, Value)> for Arguments {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Deferred rendering of the content of a helper.
///
/// Children are rendered when, and as often as, the helper asks for them.
pub struct Children<'a> {
    render: Box<dyn Fn(&mut RenderingContext) -> Result<Value, Error> + 'a>,
}

impl<'a> Children<'a> {
    /// Create [`Children`] rendered by the given closure.
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&mut RenderingContext) -> Result<Value, Error> + 'a,
    {
        Self {
            render: Box::new(render),
        }
    }

    /// Create [`Children`] that always render to the given value.
    pub fn from_value(value: Value) -> Self {
        Self::new(move |_| Ok(value.clone()))
    }

    /// Render the children.
    ///
    /// # Errors
    ///
    /// Propagates any error raised while rendering.
    pub fn render(&self, context: &mut RenderingContext) -> Result<Value, Error> {
        (self.render)(context)
    }

    /// Render the children and return their text.
    ///
    /// # Errors
    ///
    /// Propagates any error raised while rendering.
    pub fn render_text(&self, context: &mut RenderingContext) -> Result<String, Error> {
        self.render(context).map(|value| to_text(&value))
    }
}

impl Debug for Children<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Children")
    }
}

/// The compiled parts of a helper invocation, given to [`Helper::compile`].
pub struct Compilation {
    pub descriptor: HelperDescriptor,
    /// Argument fragments, including defaults of omitted optional arguments.
    pub arguments: Vec<(String, Fragment)>,
    /// Renders the concatenated children.
    pub children: Fragment,
}

impl Compilation {
    /// Return a [`Fragment`] that evaluates the arguments and invokes the
    /// helper each time it is called, exactly as the interpreter would.
    pub fn render_static(self) -> Fragment {
        let Compilation {
            descriptor,
            arguments,
            children,
        } = self;

        fragment(move |context| {
            let mut values = Arguments::new();
            for (name, argument) in &arguments {
                values.insert(name.as_str(), argument(context)?);
            }
            let content = Children::new(|context| children(context));

            descriptor.invoke(values, &content, context)
        })
    }
}

/// A registered helper together with its declared arguments.
#[derive(Clone)]
pub struct HelperDescriptor {
    id: HelperId,
    /// Namespaced name the helper was registered under.
    name: String,
    helper: Arc<dyn Helper>,
    schema: Arc<ArgumentSchema>,
    /// Name of the content argument, or the reason none can be chosen.
    content: Result<Option<String>, String>,
}

impl HelperDescriptor {
    pub(crate) fn new(name: String, helper: Arc<dyn Helper>, schema: Arc<ArgumentSchema>) -> Self {
        let content = match helper.content() {
            ContentPolicy::Children => Ok(None),
            ContentPolicy::Argument(Some(argument)) => match schema.get(argument) {
                Some(_) => Ok(Some(argument.to_string())),
                None => Err(format!(
                    "`{name}` takes its content from `{argument}`, which it does not declare"
                )),
            },
            ContentPolicy::Argument(None) => match schema.first_optional() {
                Some(definition) => Ok(Some(definition.name().to_string())),
                None => Err(format!(
                    "`{name}` takes its content from an argument, but declares no optional \
                    argument to use"
                )),
            },
        };

        Self {
            id: helper.id(),
            name,
            helper,
            schema,
            content,
        }
    }

    pub fn id(&self) -> HelperId {
        self.id
    }

    /// Return the namespaced name, such as `f:cycle`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn helper(&self) -> &dyn Helper {
        self.helper.as_ref()
    }

    pub fn schema(&self) -> &ArgumentSchema {
        &self.schema
    }

    /// Return true if the children of this invocation are escaped before the
    /// helper receives them.
    ///
    /// Children of a helper whose output is escaped are passed through as
    /// they are, so that text is escaped once.
    pub fn escapes_children(&self) -> bool {
        self.helper.escape_children() && !self.helper.escape_output()
    }

    /// Return the name of the argument that replaces the children when supplied.
    pub fn content_argument(&self) -> Option<&str> {
        self.content.as_ref().ok().and_then(|name| name.as_deref())
    }

    /// Check that the static contract of the helper can be satisfied.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind [`ErrorKind::Configuration`] if no
    /// content argument can be chosen for the helper.
    pub fn validate(&self) -> Result<(), Error> {
        match &self.content {
            Ok(_) => Ok(()),
            Err(reason) => {
                Err(Error::of(ErrorKind::Configuration, INVALID_CONFIGURATION).with_help(reason))
            }
        }
    }

    /// Check the argument types and render the helper.
    ///
    /// Both interpreted and compiled templates invoke helpers through here.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind [`ErrorKind::ArgumentType`] when an argument
    /// has the wrong shape, or any error raised by the helper.
    pub fn invoke(
        &self,
        arguments: Arguments,
        children: &Children<'_>,
        context: &mut RenderingContext,
    ) -> Result<Value, Error> {
        for definition in self.schema.definitions() {
            let Some(value) = arguments.get(definition.name()) else {
                continue;
            };
            if !definition.kind().accepts(value) {
                return Err(
                    Error::of(ErrorKind::ArgumentType, INVALID_ARGUMENT_TYPE).with_help(format!(
                        "argument `{}` of `{}` expects {}, received {}",
                        definition.name(),
                        self.name,
                        definition.kind(),
                        describe(value)
                    )),
                );
            }
        }

        let content = self
            .content_argument()
            .and_then(|name| arguments.get(name))
            .filter(|value| !value.is_empty())
            .cloned();
        match content {
            Some(value) => self
                .helper
                .render(&arguments, &Children::from_value(value), context),
            None => self.helper.render(&arguments, children, context),
        }
    }
}

impl Debug for HelperDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelperDescriptor")
            .field("name", &self.name)
            .field("type", &self.id.name())
            .finish()
    }
}

impl PartialEq for HelperDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

/// Return a short description of the shape of a value.
fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ArgumentSchema, ArgumentType, Arguments, Children, ContentPolicy, Helper,
        HelperDescriptor, HelperId,
    };
    use crate::{
        render::RenderingContext,
        report::{Error, ErrorKind},
        value::Value,
    };
    use std::sync::Arc;

    /// Renders its content between brackets.
    struct Bracket;

    impl Helper for Bracket {
        fn arguments(&self) -> ArgumentSchema {
            ArgumentSchema::new()
                .with_optional("value", ArgumentType::String, "Content", ())
                .with_optional("count", ArgumentType::Number, "Unused", 1_i64)
        }

        fn render(
            &self,
            _: &Arguments,
            children: &Children,
            context: &mut RenderingContext,
        ) -> Result<Value, Error> {
            Ok(Value::String(format!("[{}]", children.render_text(context)?)))
        }

        fn content(&self) -> ContentPolicy {
            ContentPolicy::Argument(None)
        }
    }

    /// Takes content from an argument but declares none.
    struct Misconfigured;

    impl Helper for Misconfigured {
        fn arguments(&self) -> ArgumentSchema {
            ArgumentSchema::new().with_required("value", ArgumentType::Any, "Required")
        }

        fn render(
            &self,
            _: &Arguments,
            _: &Children,
            _: &mut RenderingContext,
        ) -> Result<Value, Error> {
            Ok(Value::Null)
        }

        fn content(&self) -> ContentPolicy {
            ContentPolicy::Argument(None)
        }
    }

    fn describe<H: Helper>(helper: H) -> HelperDescriptor {
        let schema = Arc::new(helper.arguments());
        HelperDescriptor::new("t:test".to_string(), Arc::new(helper), schema)
    }

    #[test]
    fn test_content_argument_defaults_to_first_optional() {
        assert_eq!(describe(Bracket).content_argument(), Some("value"));
    }

    #[test]
    fn test_content_argument_requires_optional() {
        let error = describe(Misconfigured).validate().unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_content_argument_replaces_children() {
        let descriptor = describe(Bracket);
        let children = Children::from_value(Value::from("children"));
        let mut context = RenderingContext::default();

        let supplied: Arguments = [("value".to_string(), Value::from("argument"))]
            .into_iter()
            .collect();
        assert_eq!(
            descriptor.invoke(supplied, &children, &mut context).unwrap(),
            Value::from("[argument]")
        );

        let empty: Arguments = [("value".to_string(), Value::from(""))].into_iter().collect();
        assert_eq!(
            descriptor.invoke(empty, &children, &mut context).unwrap(),
            Value::from("[children]")
        );
    }

    #[test]
    fn test_argument_type_checked() {
        let descriptor = describe(Bracket);
        let children = Children::from_value(Value::Null);
        let arguments: Arguments = [("count".to_string(), Value::from("many"))]
            .into_iter()
            .collect();
        let error = descriptor
            .invoke(arguments, &children, &mut RenderingContext::default())
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ArgumentType);
        assert!(error.help().unwrap().contains("`count` of `t:test` expects number"));
    }

    #[test]
    fn test_helper_id_distinguishes_types() {
        assert_eq!(Bracket.id(), HelperId::of::<Bracket>());
        assert_ne!(Bracket.id(), Misconfigured.id());
    }
}
