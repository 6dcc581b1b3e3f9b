use crate::{
    report::{list_names, Error, ErrorKind, INVALID_ARGUMENTS},
    value::Value,
};
use std::fmt::Display;

/// Declared type of a helper argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentType {
    /// Accepts every value.
    Any,
    /// Scalars and objects that convert to text.
    String,
    /// Numbers, or strings that parse as numbers.
    Number,
    /// Every value, judged by truthiness.
    Bool,
    /// Mappings, sequences and iterable objects.
    Array,
}

impl ArgumentType {
    /// Return true if the value has an acceptable shape for this type.
    ///
    /// Null is accepted by every type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (ArgumentType::Any, _) | (ArgumentType::Bool, _) => true,
            (ArgumentType::String, Value::Object(object)) => object.to_text().is_some(),
            (ArgumentType::String, Value::Array(_) | Value::Map(_)) => false,
            (ArgumentType::String, _) => true,
            (ArgumentType::Number, Value::Number(_)) => true,
            (ArgumentType::Number, Value::String(string)) => {
                string.trim().parse::<f64>().is_ok()
            }
            (ArgumentType::Number, _) => false,
            (ArgumentType::Array, value) => value.is_iterable(),
        }
    }
}

impl Display for ArgumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgumentType::Any => write!(f, "any"),
            ArgumentType::String => write!(f, "string"),
            ArgumentType::Number => write!(f, "number"),
            ArgumentType::Bool => write!(f, "bool"),
            ArgumentType::Array => write!(f, "array"),
        }
    }
}

/// Declaration of a single helper argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDefinition {
    name: String,
    kind: ArgumentType,
    description: String,
    required: bool,
    default: Option<Value>,
}

impl ArgumentDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ArgumentType {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The default value of an optional argument. Always `None` for required ones.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// The arguments a helper declares, in declaration order.
///
/// # Examples
///
/// ```
/// use vellum::helper::{ArgumentSchema, ArgumentType};
///
/// let schema = ArgumentSchema::new()
///     .with_required("as", ArgumentType::String, "Name of the iteration variable")
///     .with_optional("values", ArgumentType::Array, "Values to cycle through", ());
///
/// assert_eq!(schema.first_optional().map(|d| d.name()), Some("values"));
/// assert!(schema.check(&["as"]).is_ok());
/// assert!(schema.check(&["values"]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentSchema {
    definitions: Vec<ArgumentDefinition>,
    arbitrary: bool,
    deprecation: Option<String>,
}

impl ArgumentSchema {
    /// Create an empty [`ArgumentSchema`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required argument.
    ///
    /// # Panics
    ///
    /// Panics if an argument with the same name was already declared.
    pub fn with_required<N, D>(self, name: N, kind: ArgumentType, description: D) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        self.declare(ArgumentDefinition {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            default: None,
        })
    }

    /// Declare an optional argument with the given default.
    ///
    /// Pass `()` for a null default.
    ///
    /// # Panics
    ///
    /// Panics if an argument with the same name was already declared.
    pub fn with_optional<N, D, V>(
        self,
        name: N,
        kind: ArgumentType,
        description: D,
        default: V,
    ) -> Self
    where
        N: Into<String>,
        D: Into<String>,
        V: Into<DefaultValue>,
    {
        self.declare(ArgumentDefinition {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            default: Some(default.into().0),
        })
    }

    /// Accept arguments that were not declared.
    pub fn with_arbitrary(mut self) -> Self {
        self.arbitrary = true;

        self
    }

    /// Mark the helper as deprecated with the given message.
    pub fn with_deprecation<T>(mut self, message: T) -> Self
    where
        T: Into<String>,
    {
        self.deprecation = Some(message.into());

        self
    }

    fn declare(mut self, definition: ArgumentDefinition) -> Self {
        assert!(
            self.get(definition.name()).is_none(),
            "argument `{}` is declared twice",
            definition.name()
        );
        self.definitions.push(definition);

        self
    }

    /// Return the declaration with the given name.
    pub fn get(&self, name: &str) -> Option<&ArgumentDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Return all declarations in declaration order.
    pub fn definitions(&self) -> &[ArgumentDefinition] {
        &self.definitions
    }

    /// Return the first declared optional argument.
    pub fn first_optional(&self) -> Option<&ArgumentDefinition> {
        self.definitions.iter().find(|d| !d.required)
    }

    pub fn allows_arbitrary(&self) -> bool {
        self.arbitrary
    }

    pub fn deprecation(&self) -> Option<&str> {
        self.deprecation.as_deref()
    }

    /// Check the supplied argument names against the declarations.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind [`ErrorKind::Argument`] listing every missing
    /// required argument and every undeclared argument, unless the schema
    /// accepts arbitrary arguments.
    pub fn check(&self, supplied: &[&str]) -> Result<(), Error> {
        let missing: Vec<_> = self
            .definitions
            .iter()
            .filter(|d| d.required && !supplied.contains(&d.name()))
            .map(|d| d.name())
            .collect();
        let unknown: Vec<_> = if self.arbitrary {
            vec![]
        } else {
            supplied
                .iter()
                .filter(|name| self.get(name).is_none())
                .collect()
        };

        if missing.is_empty() && unknown.is_empty() {
            return Ok(());
        }

        let mut help = vec![];
        if !missing.is_empty() {
            help.push(format!("missing required {}", list_names(&missing)));
        }
        if !unknown.is_empty() {
            let declared: Vec<_> = self.definitions.iter().map(|d| d.name()).collect();
            help.push(format!(
                "unknown {}, declared arguments are {}",
                list_names(&unknown),
                list_names(&declared)
            ));
        }

        Err(Error::of(ErrorKind::Argument, INVALID_ARGUMENTS).with_help(help.join("; ")))
    }
}

/// Default value of an optional argument.
pub struct DefaultValue(Value);

impl<T> From<T> for DefaultValue
where
    T: Into<Value>,
{
    fn from(value: T) -> Self {
        Self(value.into())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}
