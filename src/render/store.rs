use crate::{
    report::Error,
    value::{Map, Object, Value},
};
use serde::Serialize;
use serde_json::to_value;
use std::{fmt::Debug, sync::Arc};

/// Source of the variables that object accessors read.
pub trait VariableProvider: Debug + Send + Sync {
    /// Return the variable with the given name.
    fn get(&self, name: &str) -> Option<&Value>;

    /// Return the names of all variables.
    fn names(&self) -> Vec<String>;

    /// Return true if a variable with the given name exists.
    fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Provides storage for data that a [`Template`][`crate::Template`] can be
/// rendered with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    data: Map,
}

impl Store {
    /// Create a new [`Store`].
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::Store;
    ///
    /// let store = Store::new();
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key-value pair into the [`Store`].
    ///
    /// # Errors
    ///
    /// Returns an error if the serialization fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::Store;
    ///
    /// let mut store = Store::new();
    /// let result = store.insert("name", "taylor");
    ///
    /// assert!(result.is_ok());
    /// ```
    pub fn insert<S, T>(&mut self, key: S, value: T) -> Result<(), Error>
    where
        S: Into<String>,
        T: Serialize,
    {
        let key = key.into();
        let value = to_value(&value).map_err(|error| {
            Error::build(format!("value of `{key}` is unserializable"))
                .with_help(error.to_string())
        })?;
        self.data.insert(key, value.into());

        Ok(())
    }

    /// Inserts a key-value pair into the [`Store`].
    ///
    /// # Panics
    ///
    /// Panics if the serialization fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::Store;
    ///
    /// let mut store = Store::new();
    /// store.insert_must("name", "taylor");
    /// ```
    #[inline]
    pub fn insert_must<S, T>(&mut self, key: S, value: T)
    where
        S: Into<String>,
        T: Serialize,
    {
        if let Err(error) = self.insert(key, value) {
            panic!("{error}");
        }
    }

    /// Inserts a [`Value`] without serializing it.
    #[inline]
    pub fn insert_value<S, T>(&mut self, key: S, value: T)
    where
        S: Into<String>,
        T: Into<Value>,
    {
        self.data.insert(key.into(), value.into());
    }

    /// Inserts a host [`Object`].
    #[inline]
    pub fn insert_object<S, T>(&mut self, key: S, object: T)
    where
        S: Into<String>,
        T: Object + 'static,
    {
        self.data.insert(key.into(), Value::Object(Arc::new(object)));
    }

    /// Inserts a key-value pair into the [`Store`].
    ///
    /// Returns the `Store`, so additional methods may be chained.
    ///
    /// # Errors
    ///
    /// Returns an error if the serialization fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::Store;
    ///
    /// let store = Store::new().with("name", "taylor");
    ///
    /// assert!(store.is_ok());
    /// ```
    #[inline]
    pub fn with<S, T>(mut self, key: S, value: T) -> Result<Self, Error>
    where
        S: Into<String>,
        T: Serialize,
    {
        self.insert(key, value)?;

        Ok(self)
    }

    /// Inserts a key-value pair into the [`Store`].
    ///
    /// Returns the `Store`, so additional methods may be chained.
    ///
    /// # Panics
    ///
    /// Panics if the serialization fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::Store;
    ///
    /// let store = Store::new().with_must("name", "taylor");
    /// ```
    #[inline]
    pub fn with_must<S, T>(mut self, key: S, value: T) -> Self
    where
        S: Into<String>,
        T: Serialize,
    {
        self.insert_must(key, value);

        self
    }

    /// Inserts a [`Value`] and returns the `Store`.
    #[inline]
    pub fn with_value<S, T>(mut self, key: S, value: T) -> Self
    where
        S: Into<String>,
        T: Into<Value>,
    {
        self.insert_value(key, value);

        self
    }

    /// Inserts a host [`Object`] and returns the `Store`.
    #[inline]
    pub fn with_object<S, T>(mut self, key: S, object: T) -> Self
    where
        S: Into<String>,
        T: Object + 'static,
    {
        self.insert_object(key, object);

        self
    }

    /// Returns a reference to the [`Value`] corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::{Store, Value};
    ///
    /// let store = Store::new().with_must("name", "taylor");
    /// let result = store.get("name");
    ///
    /// assert_eq!(result, Some(&Value::from("taylor")));
    /// ```
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl VariableProvider for Store {
    fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    fn names(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }
}

/// Layers local variables over a parent [`VariableProvider`].
///
/// Reads check the local variables first. Writes only ever reach the local
/// layer, so the parent is never modified.
#[derive(Debug, Clone)]
pub struct ScopedVariableProvider {
    parent: Arc<dyn VariableProvider>,
    local: Store,
}

impl ScopedVariableProvider {
    /// Create a new [`ScopedVariableProvider`] over the given parent.
    pub fn new(parent: Arc<dyn VariableProvider>, local: Store) -> Self {
        Self { parent, local }
    }

    /// Set a local variable, shadowing any parent variable of the same name.
    pub fn set<S, T>(&mut self, key: S, value: T)
    where
        S: Into<String>,
        T: Into<Value>,
    {
        self.local.insert_value(key, value);
    }

    /// Return the parent provider.
    pub fn global(&self) -> Arc<dyn VariableProvider> {
        Arc::clone(&self.parent)
    }

    /// Return the local variables.
    pub fn local(&self) -> &Store {
        &self.local
    }
}

impl VariableProvider for ScopedVariableProvider {
    fn get(&self, name: &str) -> Option<&Value> {
        VariableProvider::get(&self.local, name).or_else(|| self.parent.get(name))
    }

    fn names(&self) -> Vec<String> {
        let mut names = self.local.names();
        for name in self.parent.names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        names
    }
}

#[cfg(test)]
mod tests {
    use super::{ScopedVariableProvider, Store, VariableProvider};
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use std::sync::Arc;

    #[derive(Serialize)]
    struct Person {
        name: String,
        age: u8,
    }

    #[test]
    fn test_store_insert() {
        let mut store = Store::new();
        store.insert_must("one", "two");

        assert_eq!(store.get("one"), Some(&Value::from("two")));
    }

    #[test]
    fn test_store_insert_struct() {
        let store = Store::new().with_must(
            "person",
            Person {
                name: "Taylor".to_string(),
                age: 30,
            },
        );
        let Some(Value::Map(person)) = store.get("person") else {
            panic!("expected a map");
        };

        assert_eq!(person.get("name"), Some(&Value::from("Taylor")));
        assert_eq!(person.get("age"), Some(&Value::from(30_u64)));
    }

    #[test]
    fn test_scoped_shadows_parent() {
        let parent: Arc<dyn VariableProvider> = Arc::new(
            Store::new()
                .with_value("one", "one")
                .with_value("two", "two"),
        );
        let mut scoped =
            ScopedVariableProvider::new(Arc::clone(&parent), Store::new().with_value("one", "1"));
        scoped.set("three", 3_i64);

        assert_eq!(VariableProvider::get(&scoped, "one"), Some(&Value::from("1")));
        assert_eq!(VariableProvider::get(&scoped, "two"), Some(&Value::from("two")));
        assert_eq!(scoped.names(), vec!["one", "three", "two"]);

        // The parent is untouched.
        assert_eq!(parent.get("one"), Some(&Value::from("one")));
        assert!(!parent.exists("three"));
        assert!(scoped.global().exists("two"));
    }
}
