use super::{Pointer, RED, RESET};
use crate::{region::Region, report::Visual};
use std::fmt::{Debug, Display, Formatter, Result};

/// Classifies an [`Error`] by the stage and reason of the failure.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// Malformed or unterminated template syntax.
    Parse,
    /// A tag names a helper that is not registered in its namespace.
    UnresolvedHelper,
    /// A helper was invoked with a missing required or an undeclared argument.
    Argument,
    /// An argument evaluated to a value of the wrong shape for its declaration.
    ArgumentType,
    /// The static contract of a helper cannot be satisfied.
    Configuration,
    /// An object accessor reached a restricted property with no accessor method.
    InaccessibleProperty,
    /// Template source could not be loaded.
    Source,
    /// General failure while rendering.
    Render,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            ErrorKind::Parse => write!(f, "parse error"),
            ErrorKind::UnresolvedHelper => write!(f, "unresolved helper"),
            ErrorKind::Argument => write!(f, "argument error"),
            ErrorKind::ArgumentType => write!(f, "argument type error"),
            ErrorKind::Configuration => write!(f, "configuration error"),
            ErrorKind::InaccessibleProperty => write!(f, "inaccessible property"),
            ErrorKind::Source => write!(f, "source error"),
            ErrorKind::Render => write!(f, "render error"),
        }
    }
}

/// Describes an error, and allows adding a contextual help text and visualization.
///
/// # Examples
///
/// Creating an [`Error`] that includes a [`Visual`] of type [`Pointer`]:
///
/// ```
/// use vellum::{Error, ErrorKind};
///
/// let error = Error::of(ErrorKind::Parse, "unexpected token")
///     .with_pointer("<f:if condition=>", (16..17).into())
///     .with_name("template.html")
///     .with_help("expected a quoted attribute value");
///
/// assert_eq!(error.kind(), ErrorKind::Parse);
/// assert_eq!(error.offset(), Some(16));
/// ```
///
/// When printed with `println!("{:#}", error)` the [`Error`] produces this output:
///
/// ```text
/// error: unexpected token
///   --> template.html:1:17
///    |
///  1 | <f:if condition=>
///    |                 ^
///    |
///   = help: expected a quoted attribute value
/// ```
pub struct Error {
    /// Stage and reason of the failure.
    kind: ErrorKind,
    /// Describes the cause of the [`Error`].
    reason: String,
    /// A visualization to help illustrate the [`Error`].
    visual: Option<Box<dyn Visual>>,
    /// Additional information to display with the [`Error`].
    help: Option<String>,
    /// The name of the Template that the [`Error`] comes from.
    name: Option<String>,
    /// Location within the template source.
    region: Option<Region>,
}

impl Error {
    /// Create a new [`Error`] of kind [`ErrorKind::Render`] with the given reason text.
    ///
    /// The additional fields may be populated using the various methods
    /// defined on `Error`.
    pub fn build<T>(reason: T) -> Self
    where
        T: Into<String>,
    {
        Self::of(ErrorKind::Render, reason)
    }

    /// Create a new [`Error`] of the given kind with the given reason text.
    pub fn of<T>(kind: ErrorKind, reason: T) -> Self
    where
        T: Into<String>,
    {
        Error {
            kind,
            reason: reason.into(),
            name: None,
            visual: None,
            help: None,
            region: None,
        }
    }

    /// Set the reason text, which is a short summary of the [`Error`].
    pub fn with_reason<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.reason = text.into();

        self
    }

    /// Set the name of the [`Template`][`crate::Template`] that the [`Error`]
    /// is related to.
    ///
    /// An existing name is kept, so the innermost template wins when errors
    /// bubble through nested renders.
    pub fn with_name<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        if self.name.is_none() {
            self.name = Some(text.into());
        }

        self
    }

    /// Set the [`Visual`], which is a visualization that helps illustrate the
    /// cause of the error.
    pub fn with_visual(mut self, visual: impl Visual + 'static) -> Self {
        self.visual = Some(Box::new(visual));

        self
    }

    /// Set the visualization to a new [`Pointer`] with the given source text and
    /// [`Region`], and remember the `Region` as the location of the error.
    ///
    /// An existing location is kept.
    pub fn with_pointer(mut self, source: &str, region: Region) -> Self {
        if self.region.is_none() {
            self.region = Some(region);
            self.visual = Some(Box::new(Pointer::new(source, region)));
        }

        self
    }

    /// Remember the [`Region`] as the location of the error.
    ///
    /// An existing location is kept, so the innermost location wins.
    pub fn with_region(mut self, region: Region) -> Self {
        if self.region.is_none() {
            self.region = Some(region);
        }

        self
    }

    /// Add a [`Pointer`] into the given source text at the location of the
    /// error, if it has a location and no visualization yet.
    pub fn with_source(mut self, source: &str) -> Self {
        if let (Some(region), None) = (self.region, &self.visual) {
            self.visual = Some(Box::new(Pointer::new(source, region)));
        }

        self
    }

    /// Set the help text, which is contextual information to accompany the
    /// reason text.
    pub fn with_help<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.help = Some(text.into());

        self
    }

    /// Return the [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return the reason text.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Return the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Return the name of the `Template` that the error is related to.
    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Return the byte offset in the template source where the error was found.
    pub fn offset(&self) -> Option<usize> {
        self.region.map(|region| region.begin)
    }

    /// Return the [`Region`] in the template source where the error was found.
    pub fn region(&self) -> Option<Region> {
        self.region
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if !f.alternate() {
            writeln!(f, "{self:#}")?;
        }
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("reason", &self.reason)
            .field("name", &self.name)
            .field("region", &self.region)
            .field("visual", &self.visual)
            .field("help", &self.help)
            .finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let header = format!("{RED}error{RESET}");
        write!(f, "{header}: {}", self.reason)?;

        if let (Some(visual), true) = (&self.visual, f.alternate()) {
            return visual.display(f, self.name.as_deref(), self.help.as_deref());
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.reason == other.reason
            && self.help == other.help
            && self.name == other.name
            && self.region == other.region
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};

    #[test]
    fn test_pointer_sets_region_once() {
        let error = Error::of(ErrorKind::Parse, "unexpected token")
            .with_pointer("abc def", (4..7).into())
            .with_pointer("abc def", (0..1).into());

        assert_eq!(error.offset(), Some(4));
    }

    #[test]
    fn test_innermost_name_wins() {
        let error = Error::build("boom").with_name("partial").with_name("page");

        assert_eq!(error.get_name(), Some("partial"));
    }

    #[test]
    fn test_display_alternate_includes_help() {
        let error = Error::build("missing template")
            .with_pointer("hello", (0..5).into())
            .with_name("page.html")
            .with_help("add it first");
        let printed = format!("{error:#}");

        assert!(printed.contains("page.html:1:1"));
        assert!(printed.contains("help: add it first"));
        assert!(!format!("{error}").contains("help"));
    }
}
