use super::{
    ArgumentSchema, ArgumentType, Arguments, Children, Compilation, ContentPolicy, Fragment,
    Helper,
};
use crate::{
    render::RenderingContext,
    report::{Error, ErrorKind, INVALID_ARGUMENTS},
    value::Value,
};

/// Outputs its content without escaping.
///
/// The content is `value` when given, otherwise the children.
#[derive(Debug, Default)]
pub struct RawHelper;

impl Helper for RawHelper {
    fn arguments(&self) -> ArgumentSchema {
        ArgumentSchema::new().with_optional("value", ArgumentType::Any, "The value to output", ())
    }

    fn render(
        &self,
        _: &Arguments,
        children: &Children<'_>,
        context: &mut RenderingContext,
    ) -> Result<Value, Error> {
        children.render(context)
    }

    fn compile(&self, compilation: Compilation) -> Option<Fragment> {
        Some(compilation.render_static())
    }

    fn content(&self) -> ContentPolicy {
        ContentPolicy::Argument(None)
    }

    fn escape_output(&self) -> bool {
        false
    }

    fn escape_children(&self) -> bool {
        false
    }
}

/// Changes the case of its content.
///
/// `mode` is one of `upper`, `lower`, `capital` or `uncapital`.
#[derive(Debug, Default)]
pub struct CaseHelper;

impl Helper for CaseHelper {
    fn arguments(&self) -> ArgumentSchema {
        ArgumentSchema::new()
            .with_optional("value", ArgumentType::String, "The text to change", ())
            .with_optional("mode", ArgumentType::String, "The case to change to", "upper")
    }

    fn render(
        &self,
        arguments: &Arguments,
        children: &Children<'_>,
        context: &mut RenderingContext,
    ) -> Result<Value, Error> {
        let text = children.render_text(context)?;
        let changed = match arguments.text("mode").as_str() {
            "upper" => text.to_uppercase(),
            "lower" => text.to_lowercase(),
            "capital" => change_first(&text, char::to_uppercase),
            "uncapital" => change_first(&text, char::to_lowercase),
            other => {
                return Err(Error::of(ErrorKind::Argument, INVALID_ARGUMENTS).with_help(format!(
                    "unknown mode `{other}` for `f:format.case`, expected one of \
                    `upper`, `lower`, `capital` or `uncapital`"
                )));
            }
        };

        Ok(Value::String(changed))
    }

    fn compile(&self, compilation: Compilation) -> Option<Fragment> {
        Some(compilation.render_static())
    }

    fn content(&self) -> ContentPolicy {
        ContentPolicy::Argument(Some("value"))
    }
}

/// Apply the conversion to the first character of the text.
fn change_first<F, I>(text: &str, convert: F) -> String
where
    F: Fn(char) -> I,
    I: Iterator<Item = char>,
{
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => convert(first).chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use crate::{compile::compile, render, ErrorKind, Store};
    use pretty_assertions::assert_eq;

    fn render_source(source: &str) -> Result<String, crate::Error> {
        let store = Store::new().with_must("name", "élodie <3");
        render(&compile(source)?, &store)
    }

    #[test]
    fn test_case_modes() {
        assert_eq!(
            render_source("{name -> f:format.case()}").unwrap(),
            "ÉLODIE &lt;3"
        );
        assert_eq!(
            render_source("{name -> f:format.case(mode: 'capital')}").unwrap(),
            "Élodie &lt;3"
        );
        assert_eq!(
            render_source(r#"<f:format.case value="ABC" mode="lower"/>"#).unwrap(),
            "abc"
        );
        assert_eq!(
            render_source(r#"<f:format.case mode="uncapital">Hello</f:format.case>"#).unwrap(),
            "hello"
        );
    }

    #[test]
    fn test_case_unknown_mode() {
        let error = render_source(r#"<f:format.case mode="title">x</f:format.case>"#).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Argument);
    }

    #[test]
    fn test_raw_skips_escaping() {
        assert_eq!(
            render_source("{name -> f:format.raw()}").unwrap(),
            "élodie <3"
        );
    }
}
