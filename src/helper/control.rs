use super::{ArgumentSchema, ArgumentType, Arguments, Children, Compilation, Fragment, Helper};
use crate::{
    pipe::to_text,
    render::{RenderingContext, Store},
    report::Error,
    value::{Map, Value},
};

/// Renders its children once for each item of a collection.
///
/// The item is bound to `as`, its key to `key` and an iteration summary to
/// `iteration`, when those names are given. The summary holds `index`, `cycle`,
/// `total`, `isFirst`, `isLast`, `isEven` and `isOdd`.
#[derive(Debug, Default)]
pub struct ForHelper;

impl Helper for ForHelper {
    fn arguments(&self) -> ArgumentSchema {
        ArgumentSchema::new()
            .with_required("each", ArgumentType::Array, "The collection to iterate")
            .with_required("as", ArgumentType::String, "The name of the item variable")
            .with_optional("key", ArgumentType::String, "The name of the key variable", "")
            .with_optional("reverse", ArgumentType::Bool, "Iterate in reverse", false)
            .with_optional(
                "iteration",
                ArgumentType::String,
                "The name of the iteration summary variable",
                "",
            )
    }

    fn render(
        &self,
        arguments: &Arguments,
        children: &Children<'_>,
        context: &mut RenderingContext,
    ) -> Result<Value, Error> {
        let Some(mut pairs) = arguments.value("each").to_pairs() else {
            return Ok(Value::String(String::new()));
        };
        if arguments.value("reverse").is_truthy() {
            pairs.reverse();
        }

        let name = arguments.text("as");
        let key = arguments.text("key");
        let iteration = arguments.text("iteration");
        let total = pairs.len();
        let mut output = String::new();

        for (index, (item_key, item)) in pairs.into_iter().enumerate() {
            let mut local = Store::new().with_value(name.as_str(), item);
            if !key.is_empty() {
                local.insert_value(key.as_str(), item_key);
            }
            if !iteration.is_empty() {
                local.insert_value(iteration.as_str(), summary(index, total));
            }

            output += &context.with_scope(local, |context| children.render_text(context))?;
        }

        Ok(Value::String(output))
    }

    fn compile(&self, compilation: Compilation) -> Option<Fragment> {
        Some(compilation.render_static())
    }

    fn escape_output(&self) -> bool {
        false
    }
}

/// Return the iteration summary for the item at `index`.
fn summary(index: usize, total: usize) -> Value {
    let cycle = index + 1;
    let mut map = Map::new();
    map.insert("index".to_string(), Value::from(index));
    map.insert("cycle".to_string(), Value::from(cycle));
    map.insert("total".to_string(), Value::from(total));
    map.insert("isFirst".to_string(), Value::Bool(index == 0));
    map.insert("isLast".to_string(), Value::Bool(cycle == total));
    map.insert("isEven".to_string(), Value::Bool(cycle % 2 == 0));
    map.insert("isOdd".to_string(), Value::Bool(cycle % 2 == 1));

    Value::Map(map)
}

/// Renders `then` or its children when the condition is truthy, and `else`
/// otherwise.
#[derive(Debug, Default)]
pub struct IfHelper;

impl Helper for IfHelper {
    fn arguments(&self) -> ArgumentSchema {
        ArgumentSchema::new()
            .with_required("condition", ArgumentType::Bool, "The condition to check")
            .with_optional("then", ArgumentType::Any, "Rendered when the condition holds", ())
            .with_optional("else", ArgumentType::Any, "Rendered otherwise", ())
    }

    fn render(
        &self,
        arguments: &Arguments,
        children: &Children<'_>,
        context: &mut RenderingContext,
    ) -> Result<Value, Error> {
        if !arguments.value("condition").is_truthy() {
            return Ok(arguments.value("else").clone());
        }

        match arguments.value("then") {
            Value::Null => children.render(context),
            then => Ok(then.clone()),
        }
    }

    fn compile(&self, compilation: Compilation) -> Option<Fragment> {
        Some(compilation.render_static())
    }

    fn escape_output(&self) -> bool {
        false
    }
}

/// Renders its children with the entries of `map` bound as variables.
#[derive(Debug, Default)]
pub struct AliasHelper;

impl Helper for AliasHelper {
    fn arguments(&self) -> ArgumentSchema {
        ArgumentSchema::new().with_required(
            "map",
            ArgumentType::Array,
            "Variable names and the values to bind to them",
        )
    }

    fn render(
        &self,
        arguments: &Arguments,
        children: &Children<'_>,
        context: &mut RenderingContext,
    ) -> Result<Value, Error> {
        let mut local = Store::new();
        for (name, value) in arguments.value("map").to_pairs().unwrap_or_default() {
            local.insert_value(to_text(&name), value);
        }

        context.with_scope(local, |context| children.render(context))
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
    use crate::{compile::compile, render, Store};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render_source(source: &str, store: &Store) -> String {
        render(&compile(source).unwrap(), store).unwrap()
    }

    #[test]
    fn test_for_key_and_reverse() {
        let store = Store::new().with_must("scores", json!({"ana": 3, "bo": 5}));
        let source =
            r#"<f:for each="{scores}" as="score" key="name" reverse="1">{name}={score};</f:for>"#;

        assert_eq!(render_source(source, &store), "bo=5;ana=3;");
    }

    #[test]
    fn test_for_iteration() {
        let store = Store::new().with_must("items", json!(["a", "b", "c"]));
        let source = concat!(
            r#"<f:for each="{items}" as="item" iteration="i">"#,
            "{i.cycle}/{i.total}:{i.isOdd},",
            "</f:for>",
        );

        assert_eq!(
            render_source(source, &store),
            "1/3:true,2/3:false,3/3:true,"
        );
    }

    #[test]
    fn test_for_null_renders_nothing() {
        assert_eq!(
            render_source(r#"<f:for each="{missing}" as="x">{x}</f:for>"#, &Store::new()),
            ""
        );
    }

    #[test]
    fn test_if_then_else() {
        let store = Store::new().with_must("on", true).with_must("off", 0);

        assert_eq!(
            render_source(r#"<f:if condition="{on}">yes</f:if>"#, &store),
            "yes"
        );
        assert_eq!(
            render_source(r#"<f:if condition="{off}" then="yes" else="no"/>"#, &store),
            "no"
        );
        assert_eq!(
            render_source(r#"<f:if condition="{off}">yes</f:if>"#, &store),
            ""
        );
    }
}
