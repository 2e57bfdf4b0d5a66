//! Access-controlled views
//!
//! A [`View`] wraps an [`Object`] and mediates every attribute operation
//! against the discovered [`FieldSet`] and the [`ViewOptions`]:
//!
//! - `get`: reachable, non-protected names are returned; anything else is
//!   `Undefined`, or `AccessDenied` with `allow_read_error`
//! - `set`: only field-set names (and setter-backed names) are written;
//!   anything else is dropped, or `AccessDenied` with `allow_write_error`
//! - `list_fields`: always exactly the field set
//! - `delete`: always `AccessDenied` unless `disable_delete_error`

use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{Error as _, Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::cache::DiscoveryCache;
use crate::discovery::{FieldSet, discover, is_protected};
use crate::error::{Operation, VeilError, VeilResult};
use crate::object::{Descriptor, Object};
use crate::options::ViewOptions;
use crate::value::Value;

/// Wrap `instance` in a view, resolving its fields through the global cache
pub fn create_view(instance: &Object, options: Option<ViewOptions>) -> View<'_> {
    create_view_with_cache(DiscoveryCache::global(), instance, options)
}

/// Wrap `instance` in a view, resolving its fields through `cache`
pub fn create_view_with_cache<'a>(
    cache: &DiscoveryCache,
    instance: &'a Object,
    options: Option<ViewOptions>,
) -> View<'a> {
    let options = options.unwrap_or_default();
    let identity = instance.class().type_identity();
    let fields = cache.get_or_compute(identity.as_deref(), &options, || {
        discover(instance, &options)
    });
    View::new(instance, fields, options)
}

/// Access-controlled wrapper around an [`Object`]
///
/// The view borrows the instance and never copies it. It adds no locking of
/// its own around the instance.
#[derive(Debug, Clone)]
pub struct View<'a> {
    target: &'a Object,
    fields: Arc<FieldSet>,
    options: ViewOptions,
}

impl<'a> View<'a> {
    /// Build a view from an already discovered field set
    pub fn new(target: &'a Object, fields: Arc<FieldSet>, options: ViewOptions) -> Self {
        Self {
            target,
            fields,
            options,
        }
    }

    pub fn target(&self) -> &'a Object {
        self.target
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    /// The names this view exposes, regardless of the instance's current
    /// own fields
    pub fn list_fields(&self) -> Vec<String> {
        self.fields.to_vec()
    }

    /// The shared field set backing [`list_fields`](Self::list_fields)
    pub fn field_set(&self) -> &FieldSet {
        &self.fields
    }

    fn protected_blocked(&self, name: &str) -> bool {
        is_protected(name) && !self.options.allow_protected_field
    }

    /// Read an attribute
    ///
    /// Methods come back as [`Value::Function`] bound to the wrapped instance.
    pub fn get(&self, name: &str) -> VeilResult<Value> {
        if !self.protected_blocked(name) {
            if let Some(value) = self.target.get(name) {
                return Ok(value);
            }
        }

        if self.options.allow_read_error {
            debug!(name, "Read denied");
            return Err(VeilError::denied(name, Operation::Read));
        }
        Ok(Value::Undefined)
    }

    /// Whether `name` is listed or readable through this view
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains(name)
            || (!self.protected_blocked(name) && self.target.has_property(name))
    }

    /// Write an attribute
    ///
    /// Names in the field set are assigned on the instance and always
    /// succeed; a getter-only name just ignores the value. A name outside the
    /// field set is still written when a setter backs it. Any other write is
    /// dropped silently unless `allow_write_error` is set.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> VeilResult<()> {
        let value = value.into();

        if self.fields.contains(name) {
            if !self.target.put(name, value) {
                debug!(name, "Write to read-only field dropped");
            }
            return Ok(());
        }
        if !self.protected_blocked(name) && self.has_setter(name) {
            self.target.put(name, value);
            return Ok(());
        }

        if self.options.allow_write_error {
            debug!(name, "Write denied");
            return Err(VeilError::denied(name, Operation::Write));
        }
        debug!(name, "Write dropped");
        Ok(())
    }

    fn has_setter(&self, name: &str) -> bool {
        !self.target.has_own(name)
            && self
                .target
                .class()
                .find_accessor(name)
                .is_some_and(|accessor| accessor.has_setter())
    }

    /// Delete an attribute
    ///
    /// Always denied unless `disable_delete_error` is set, in which case the
    /// request is accepted and nothing is removed.
    pub fn delete(&self, name: &str) -> VeilResult<()> {
        if self.options.disable_delete_error {
            return Ok(());
        }
        debug!(name, "Delete denied");
        Err(VeilError::denied(name, Operation::Delete))
    }

    /// Describe an attribute
    ///
    /// Field-set names are reported enumerable and configurable. Other names
    /// fall back to the instance's own descriptor unchanged.
    pub fn describe(&self, name: &str) -> Option<Descriptor> {
        if !self.fields.contains(name) {
            return self.target.own_descriptor(name);
        }

        if let Some(own) = self.target.own_descriptor(name) {
            return Some(own.exposed());
        }
        self.target
            .class()
            .find_accessor(name)
            .map(|accessor| Descriptor::Accessor {
                get: accessor.has_getter(),
                set: accessor.has_setter(),
                enumerable: true,
                configurable: true,
            })
    }

    /// Read `name` and call it with `args`
    ///
    /// A name that does not resolve to a method is treated like a denied read.
    pub fn call(&self, name: &str, args: &[Value]) -> VeilResult<Value> {
        match self.get(name)? {
            Value::Function(method) => Ok(method.call(args)),
            _ if self.options.allow_read_error => {
                debug!(name, "Call denied");
                Err(VeilError::denied(name, Operation::Call))
            }
            _ => Ok(Value::Undefined),
        }
    }

    /// Copy every listed field into an ordered map, the way spreading the
    /// view into a fresh object would
    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.fields
            .iter()
            .map(|name| {
                let value = self.target.get(name).unwrap_or_default();
                (name.to_string(), value)
            })
            .collect()
    }
}

/// Serializes the listed fields only, skipping absent values and functions
///
/// Fails if the wrapped instance is reachable from its own fields.
impl Serialize for View<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(_guard) = self.target.enter_serialize() else {
            return Err(S::Error::custom("cyclic object"));
        };
        let entries: Vec<(String, Value)> = self
            .snapshot()
            .into_iter()
            .filter(|(_, value)| !value.is_undefined() && !value.is_callable())
            .collect();

        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (name, value) in &entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
