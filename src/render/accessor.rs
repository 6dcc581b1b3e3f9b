//! Resolution of dotted accessor paths.
//!
//! Each segment of a path is resolved against the value produced by the
//! segment before it. Plain data (maps, lists and scalars) yields null for
//! anything missing. Host [`Object`]s are asked, in order:
//!
//! 1. for array-style access through [`Object::offset_get`],
//! 2. for a numeric index into their iterated items, when they are iterable,
//! 3. for a public property of exactly that name,
//! 4. for a getter method: `getName`, `GETNAME`, `isName`, then `hasName`.
//!
//! When nothing answers, the accessor fails with
//! [`ErrorKind::InaccessibleProperty`].
use super::VariableProvider;
use crate::{
    report::{Error, ErrorKind, INACCESSIBLE_PROPERTY},
    value::{Object, Property, Value},
};

/// Resolve the full path against the given variables.
///
/// A missing variable resolves to [`Value::Null`].
///
/// # Errors
///
/// Returns an [`Error`] if any segment cannot be accessed on a host object.
pub fn resolve_path<S>(provider: &dyn VariableProvider, path: &[S]) -> Result<Value, Error>
where
    S: AsRef<str>,
{
    let Some((first, rest)) = path.split_first() else {
        return Ok(Value::Null);
    };
    let mut current = provider.get(first.as_ref()).cloned().unwrap_or_default();

    for segment in rest {
        current = resolve_segment(&current, segment.as_ref())?;
    }

    Ok(current)
}

/// Resolve a single segment against the given value.
///
/// # Errors
///
/// Returns an [`Error`] if the value is a host object that exposes nothing
/// under the segment name.
pub fn resolve_segment(current: &Value, segment: &str) -> Result<Value, Error> {
    match current {
        Value::Map(map) => Ok(map.get(segment).cloned().unwrap_or_default()),
        Value::Array(items) => Ok(index(items, segment).unwrap_or_default()),
        Value::Object(object) => resolve_object(object.as_ref(), segment),
        _ => Ok(Value::Null),
    }
}

fn resolve_object(object: &dyn Object, segment: &str) -> Result<Value, Error> {
    if let Some(value) = object.offset_get(segment) {
        return Ok(value);
    }
    if let Some(value) = object.iterate().and_then(|items| index(&items, segment)) {
        return Ok(value);
    }

    let restricted = match object.property(segment) {
        Property::Public(value) => return Ok(value),
        Property::Restricted => true,
        Property::Missing => false,
    };
    for getter in getter_names(segment) {
        if let Some(value) = object.method(&getter) {
            return Ok(value);
        }
    }

    let help = if restricted {
        format!("property `{segment}` is not public and has no getter method, declare a public property or a `get{}` method", upper_first(segment))
    } else {
        format!("no public property, array key or getter method named `{segment}` exists")
    };

    Err(Error::of(ErrorKind::InaccessibleProperty, INACCESSIBLE_PROPERTY).with_help(help))
}

/// Return the item at the position named by the segment.
fn index(items: &[Value], segment: &str) -> Option<Value> {
    segment
        .parse::<usize>()
        .ok()
        .and_then(|position| items.get(position))
        .cloned()
}

/// Return the getter method names tried for a property, in order.
fn getter_names(segment: &str) -> [String; 4] {
    let upper = upper_first(segment);

    [
        format!("get{upper}"),
        format!("GET{}", segment.to_uppercase()),
        format!("is{upper}"),
        format!("has{upper}"),
    ]
}

fn upper_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{getter_names, resolve_path};
    use crate::{
        render::Store,
        report::ErrorKind,
        value::{Object, Property, Value},
    };
    use serde_json::json;

    /// Exposes the same name through every capability.
    #[derive(Debug)]
    struct Everywhere;

    impl Object for Everywhere {
        fn offset_get(&self, key: &str) -> Option<Value> {
            (key == "value").then(|| Value::from("offset"))
        }

        fn property(&self, name: &str) -> Property {
            match name {
                "value" | "field" => Property::Public(Value::from("field")),
                _ => Property::Missing,
            }
        }

        fn method(&self, name: &str) -> Option<Value> {
            match name {
                "getValue" | "getField" | "getComputed" => Some(Value::from("getter")),
                _ => None,
            }
        }
    }

    /// A private property with no getter, that is also iterable.
    #[derive(Debug)]
    struct Hidden;

    impl Object for Hidden {
        fn property(&self, name: &str) -> Property {
            match name {
                "secret" => Property::Restricted,
                _ => Property::Missing,
            }
        }

        fn iterate(&self) -> Option<Vec<Value>> {
            Some(vec![Value::from("first")])
        }
    }

    /// Only answers to upper case and boolean getters.
    #[derive(Debug)]
    struct Getters;

    impl Object for Getters {
        fn property(&self, _: &str) -> Property {
            Property::Restricted
        }

        fn method(&self, name: &str) -> Option<Value> {
            match name {
                "GETPRIVATEVALUE" => Some(Value::from("upper")),
                "isEnabled" => Some(Value::Bool(true)),
                "hasChildren" => Some(Value::Bool(false)),
                _ => None,
            }
        }
    }

    fn store() -> Store {
        Store::new()
            .with_object("everywhere", Everywhere)
            .with_object("hidden", Hidden)
            .with_object("getters", Getters)
            .with_must("data", json!({"list": ["a", "b"], "nested": {"key": 1}}))
    }

    fn resolve(path: &str) -> Result<Value, crate::Error> {
        let path: Vec<&str> = path.split('.').collect();
        resolve_path(&store(), &path)
    }

    #[test]
    fn test_offset_beats_property_and_getter() {
        assert_eq!(resolve("everywhere.value").unwrap(), Value::from("offset"));
    }

    #[test]
    fn test_property_beats_getter() {
        assert_eq!(resolve("everywhere.field").unwrap(), Value::from("field"));
    }

    #[test]
    fn test_getter_when_no_property() {
        assert_eq!(resolve("everywhere.computed").unwrap(), Value::from("getter"));
        assert_eq!(resolve("getters.privateValue").unwrap(), Value::from("upper"));
        assert_eq!(resolve("getters.enabled").unwrap(), Value::Bool(true));
        assert_eq!(resolve("getters.children").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_restricted_without_getter_fails() {
        let error = resolve("hidden.secret").unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InaccessibleProperty);
        assert!(error.help().unwrap().contains("getSecret"));
        // Iterable objects still answer numeric segments.
        assert_eq!(resolve("hidden.0").unwrap(), Value::from("first"));
    }

    #[test]
    fn test_plain_data() {
        assert_eq!(resolve("data.list.1").unwrap(), Value::from("b"));
        assert_eq!(resolve("data.nested.key").unwrap(), Value::from(1_i64));
        assert!(resolve("data.nested.missing").unwrap().is_null());
        assert!(resolve("data.list.9").unwrap().is_null());
        assert!(resolve("nothing.at.all").unwrap().is_null());
    }

    #[test]
    fn test_getter_names() {
        assert_eq!(
            getter_names("privateValue"),
            [
                "getPrivateValue".to_string(),
                "GETPRIVATEVALUE".to_string(),
                "isPrivateValue".to_string(),
                "hasPrivateValue".to_string(),
            ]
        );
    }
}
