//! Field discovery
//!
//! Computes the public surface of an instance: its own fields plus every
//! getter-backed accessor declared along its class chain, minus protected
//! names unless the options allow them.

use indexmap::IndexSet;
use tracing::trace;

use crate::object::{Class, Object};
use crate::options::ViewOptions;

/// Prefix marking a name as protected
pub const PROTECTED_PREFIX: &str = "_";

/// Whether `name` follows the protected naming convention
pub fn is_protected(name: &str) -> bool {
    name.starts_with(PROTECTED_PREFIX)
}

/// Discovered attribute names
///
/// Iteration follows discovery order but only membership is meaningful.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    names: IndexSet<String>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Owned copy of the names
    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    fn insert(&mut self, name: &str) {
        if !self.names.contains(name) {
            self.names.insert(name.to_string());
        }
    }
}

impl<S: Into<String>> FromIterator<S> for FieldSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Compute the field set of `instance` under `options`
///
/// Own field names come first, as listed at the moment of the call. Getter
/// names follow, root-most ancestor first. The root class is the base case
/// and is never scanned.
pub fn discover(instance: &Object, options: &ViewOptions) -> FieldSet {
    let mut fields = FieldSet::new();

    for name in instance.own_keys() {
        fields.insert(&name);
    }
    collect_getters(instance.class(), &mut fields);

    if !options.allow_protected_field {
        fields.names.retain(|name| !is_protected(name));
    }

    trace!(
        class = instance.class().name().unwrap_or("<anonymous>"),
        fields = fields.len(),
        "Discovered fields"
    );
    fields
}

fn collect_getters(level: &Class, fields: &mut FieldSet) {
    let Some(parent) = level.parent() else {
        return;
    };
    collect_getters(parent, fields);

    for (name, accessor) in level.accessors() {
        if accessor.has_getter() {
            fields.insert(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_is_protected() {
        assert!(is_protected("_c"));
        assert!(is_protected("__dunder"));
        assert!(!is_protected("c_"));
        assert!(!is_protected(""));
    }

    #[test]
    fn test_own_fields_and_inherited_getters() {
        let base = Class::builder("Base")
            .getter("b", |_| Value::Int(2))
            .build();
        let child = Class::builder("Child")
            .extends(&base)
            .field("a")
            .field_with("_c", 3)
            .build();
        let obj = Object::new(&child);

        let fields = discover(&obj, &ViewOptions::default());
        assert_eq!(fields.to_vec(), vec!["a", "b"]);

        let fields = discover(&obj, &ViewOptions::default().with_allow_protected_field(true));
        assert!(fields.contains("_c"));
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_shadowed_getter_listed_once() {
        let base = Class::builder("Base").getter("name", |_| "base".into()).build();
        let child = Class::builder("Child")
            .extends(&base)
            .getter("name", |_| "child".into())
            .build();
        let fields = discover(&Object::new(&child), &ViewOptions::default());
        assert_eq!(fields.to_vec(), vec!["name"]);
    }

    #[test]
    fn test_getters_root_most_first() {
        let a = Class::builder("A").getter("from_a", |_| Value::Null).build();
        let b = Class::builder("B").extends(&a).getter("from_b", |_| Value::Null).build();
        let c = Class::builder("C").extends(&b).getter("from_c", |_| Value::Null).build();
        let fields = discover(&Object::new(&c), &ViewOptions::default());
        assert_eq!(fields.to_vec(), vec!["from_a", "from_b", "from_c"]);
    }

    #[test]
    fn test_setter_only_and_methods_not_discovered() {
        let class = Class::builder("Writer")
            .setter("sink", |_, _| {})
            .method("run", |_, _| Value::Undefined)
            .build();
        let fields = discover(&Object::new(&class), &ViewOptions::default());
        assert!(fields.is_empty());
    }

    #[test]
    fn test_hidden_slots_never_discovered() {
        let obj = Object::plain();
        obj.set_slot("secret", 1);
        obj.set_field("visible", 2);
        let options = ViewOptions::default().with_allow_protected_field(true);
        let fields = discover(&obj, &options);
        assert_eq!(fields.to_vec(), vec!["visible"]);
    }

    #[test]
    fn test_plain_object_empty() {
        assert!(discover(&Object::plain(), &ViewOptions::default()).is_empty());
    }

    #[test]
    fn test_snapshot_at_discovery_time() {
        let obj = Object::new(&Class::builder("Late").build());
        let before = discover(&obj, &ViewOptions::default());
        obj.set_field("late", 1);
        let after = discover(&obj, &ViewOptions::default());
        assert!(!before.contains("late"));
        assert!(after.contains("late"));
    }
}
