use crate::{helper::HelperId, value::Value};
use std::collections::HashMap;

/// Per-render storage that helpers use to keep state between invocations,
/// keyed by helper type and name.
///
/// # Examples
///
/// ```
/// use vellum::{helper::{CycleHelper, HelperId}, render::HelperVariableContainer, Value};
///
/// let mut container = HelperVariableContainer::new();
/// let id = HelperId::of::<CycleHelper>();
/// container.add_or_update(id, "zebra", Value::from(1_u64));
///
/// assert!(container.exists(id, "zebra"));
/// assert_eq!(container.get(id, "zebra"), Some(&Value::from(1_u64)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HelperVariableContainer {
    data: HashMap<(HelperId, String), Value>,
}

impl HelperVariableContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, helper: HelperId, name: &str) -> Option<&Value> {
        self.data.get(&(helper, name.to_string()))
    }

    pub fn exists(&self, helper: HelperId, name: &str) -> bool {
        self.get(helper, name).is_some()
    }

    pub fn add_or_update<S>(&mut self, helper: HelperId, name: S, value: Value)
    where
        S: Into<String>,
    {
        self.data.insert((helper, name.into()), value);
    }

    pub fn remove(&mut self, helper: HelperId, name: &str) -> Option<Value> {
        self.data.remove(&(helper, name.to_string()))
    }
}
