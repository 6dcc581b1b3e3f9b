use super::{ArgumentSchema, ArgumentType, Arguments, Children, Compilation, Fragment, Helper};
use crate::{
    render::{RenderingContext, ScopedVariableProvider, Store},
    report::{Error, ErrorKind, INVALID_ARGUMENT_TYPE},
    value::Value,
};
use std::sync::Arc;

/// Cycles through the given values, exposing one per invocation.
///
/// Each time the helper is invoked, the next value is bound to the variable
/// named by `as` while its children render. After the last value it starts
/// over from the first. The position is kept per variable name for the
/// duration of a render.
///
/// ```text
/// <f:for each="{items}" as="item">
///     <f:cycle values="{0: 'odd', 1: 'even'}" as="zebra">
///         <li class="{zebra}">{item}</li>
///     </f:cycle>
/// </f:for>
/// ```
#[derive(Debug, Default)]
pub struct CycleHelper;

impl Helper for CycleHelper {
    fn arguments(&self) -> ArgumentSchema {
        ArgumentSchema::new()
            .with_optional(
                "values",
                ArgumentType::Array,
                "The values to cycle through",
                (),
            )
            .with_required(
                "as",
                ArgumentType::String,
                "The name of the variable that holds the current value",
            )
    }

    fn render(
        &self,
        arguments: &Arguments,
        children: &Children<'_>,
        context: &mut RenderingContext,
    ) -> Result<Value, Error> {
        let values = arguments.value("values");
        if values.is_null() {
            return children.render(context);
        }
        let values = values.to_sequence().ok_or_else(|| {
            Error::of(ErrorKind::ArgumentType, INVALID_ARGUMENT_TYPE)
                .with_help("`values` of `f:cycle` must be an array or an iterable object")
        })?;
        let name = arguments.text("as");
        let index = context
            .helper_variables()
            .get(self.id(), &name)
            .and_then(Value::as_u64)
            .map_or(0, |index| index as usize);

        let current = values.get(index).cloned().unwrap_or_default();
        let scoped = ScopedVariableProvider::new(
            context.variable_provider(),
            Store::new().with_value(name.as_str(), current),
        );
        let parent = context.set_variable_provider(Arc::new(scoped));
        let output = children.render(context);
        context.set_variable_provider(parent);

        let next = if index + 1 < values.len() { index + 1 } else { 0 };
        context
            .helper_variables_mut()
            .add_or_update(self.id(), name, Value::from(next));

        output
    }

    fn compile(&self, compilation: Compilation) -> Option<Fragment> {
        Some(compilation.render_static())
    }

    fn escape_output(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::{compile::compile, render, Engine, Store};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const ZEBRA: &str = concat!(
        r#"<f:for each="{items}" as="item">"#,
        r#"<f:cycle values="{0: 'odd', 1: 'even'}" as="zebra">{zebra},</f:cycle>"#,
        r#"</f:for>"#,
    );

    fn items() -> Store {
        Store::new().with_must("items", json!([1, 2, 3, 4]))
    }

    #[test]
    fn test_cycle_alternates() {
        let template = compile(ZEBRA).unwrap();

        assert_eq!(render(&template, &items()).unwrap(), "odd,even,odd,even,");
    }

    #[test]
    fn test_cycle_restarts_each_render() {
        let engine = Engine::default();
        let template = engine.compile(ZEBRA).unwrap();
        let three = Store::new().with_must("items", json!([1, 2, 3]));

        assert_eq!(engine.render(&template, &three).unwrap(), "odd,even,odd,");
        assert_eq!(engine.render(&template, &items()).unwrap(), "odd,even,odd,even,");
    }

    #[test]
    fn test_cycle_variable_is_scoped() {
        let source = r#"<f:cycle values="{['a']}" as="letter">{letter}</f:cycle>[{letter}]"#;
        let template = compile(source).unwrap();

        assert_eq!(render(&template, &Store::new()).unwrap(), "a[]");
    }

    #[test]
    fn test_cycle_without_values_renders_children() {
        let template = compile(r#"<f:cycle as="x">plain</f:cycle>"#).unwrap();

        assert_eq!(render(&template, &Store::new()).unwrap(), "plain");
    }

    #[test]
    fn test_cycle_rejects_scalar_values() {
        let template = compile(r#"<f:cycle values="odd" as="x">{x}</f:cycle>"#).unwrap();
        let error = render(&template, &Store::new()).unwrap_err();

        assert_eq!(error.kind(), crate::ErrorKind::ArgumentType);
    }
}
