mod cache;
mod compiler;
mod lex;
mod parse;
mod syntax;
mod template;

pub use crate::compile::{
    cache::{Cache, MemoryCache, NullCache},
    compiler::{Compiler, Executable},
    lex::token,
    parse::{tree, Parser},
    template::{identify, Template},
};

pub(crate) use crate::compile::template::locate;

use crate::{report::Error, resolver::Resolver, settings::Settings};

/// Compile a [`Template`] from the given text.
///
/// Provides a shortcut to quickly compile a `Template` without creating
/// an `Engine`, using the built-in helpers and default settings.
///
/// # Examples
///
/// ```
/// use vellum::compile;
///
/// let template = compile(r#"<f:if condition="{visible}">{name}</f:if>"#);
/// assert!(template.is_ok())
/// ```
pub fn compile(text: &str) -> Result<Template, Error> {
    parse_template(text, None, &Resolver::default(), &Settings::default())
}

/// Parse a [`Template`] from the given text, resolving helpers through the
/// given [`Resolver`].
///
/// # Errors
///
/// Returns an [`Error`] when the text is malformed, names an unknown helper,
/// or invokes a helper with invalid arguments.
pub fn parse_template(
    text: &str,
    name: Option<&str>,
    resolver: &Resolver,
    settings: &Settings,
) -> Result<Template, Error> {
    let finder = syntax::finder();

    Parser::new(text, &finder, resolver, settings).compile(name)
}
