//! Dynamic object model
//!
//! Rust has no runtime class reflection, so views operate over this small
//! object model instead:
//!
//! - [`Class`]: a type descriptor with an explicit parent link, declared
//!   fields, an accessor registry (computed properties) and methods
//! - [`Object`]: a shared handle to an instance holding its own fields and
//!   its hidden-tier slots
//!
//! Every class built through [`Class::builder`] descends from the shared
//! root class returned by [`Class::root`]. The root has no parent and acts
//! as the sentinel that ends ancestor traversal.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::ser::{Error as _, Serialize, SerializeMap, Serializer};

use crate::value::{BoundMethod, Value};

/// Computed-property getter
pub type Getter = Arc<dyn Fn(&Object) -> Value + Send + Sync>;

/// Computed-property setter
pub type Setter = Arc<dyn Fn(&Object, Value) + Send + Sync>;

/// Method body; receives the instance it is called on
pub type Method = Arc<dyn Fn(&Object, &[Value]) -> Value + Send + Sync>;

/// A computed property declared on a class
#[derive(Clone, Default)]
pub struct Accessor {
    pub getter: Option<Getter>,
    pub setter: Option<Setter>,
}

impl Accessor {
    pub fn has_getter(&self) -> bool {
        self.getter.is_some()
    }

    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }
}

/// Property metadata, as reported by [`Object::own_descriptor`] and
/// [`View::describe`](crate::View::describe)
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Data {
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: bool,
        set: bool,
        enumerable: bool,
        configurable: bool,
    },
}

impl Descriptor {
    pub fn is_enumerable(&self) -> bool {
        match self {
            Descriptor::Data { enumerable, .. } | Descriptor::Accessor { enumerable, .. } => {
                *enumerable
            }
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            Descriptor::Data { configurable, .. } | Descriptor::Accessor { configurable, .. } => {
                *configurable
            }
        }
    }

    /// Mark the descriptor enumerable and configurable, keeping the rest
    pub(crate) fn exposed(self) -> Self {
        match self {
            Descriptor::Data {
                value, writable, ..
            } => Descriptor::Data {
                value,
                writable,
                enumerable: true,
                configurable: true,
            },
            Descriptor::Accessor { get, set, .. } => Descriptor::Accessor {
                get,
                set,
                enumerable: true,
                configurable: true,
            },
        }
    }
}

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

static ROOT_CLASS: LazyLock<Arc<Class>> = LazyLock::new(|| {
    Arc::new(Class {
        id: 0,
        name: Some("Object".to_string()),
        parent: None,
        fields: Vec::new(),
        accessors: IndexMap::new(),
        methods: IndexMap::new(),
    })
});

/// A type descriptor
pub struct Class {
    id: u64,
    name: Option<String>,
    parent: Option<Arc<Class>>,
    fields: Vec<(String, Value)>,
    accessors: IndexMap<String, Accessor>,
    methods: IndexMap<String, Method>,
}

impl Class {
    /// The shared root class every other class descends from
    pub fn root() -> Arc<Class> {
        Arc::clone(&ROOT_CLASS)
    }

    /// Start building a named class
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(Some(name.into()))
    }

    /// Start building a class without a name; it has no type identity
    pub fn anonymous() -> ClassBuilder {
        ClassBuilder::new(None)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<&Arc<Class>> {
        self.parent.as_ref()
    }

    /// Whether this is the ancestor with no further ancestor
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Stable identity string used to key cached discovery results
    ///
    /// `None` for anonymous classes and for the root class, whose instances
    /// are plain objects.
    pub fn type_identity(&self) -> Option<String> {
        if self.is_root() {
            return None;
        }
        self.name.as_ref().map(|name| format!("{}#{}", name, self.id))
    }

    /// Accessors declared on this level only
    pub fn accessors(&self) -> impl Iterator<Item = (&str, &Accessor)> {
        self.accessors.iter().map(|(name, acc)| (name.as_str(), acc))
    }

    /// This class followed by each ancestor, ending with the root
    pub fn ancestry(&self) -> Ancestry<'_> {
        Ancestry { next: Some(self) }
    }

    /// Nearest accessor with the given name in the class chain
    pub fn find_accessor(&self, name: &str) -> Option<&Accessor> {
        self.ancestry().find_map(|level| level.accessors.get(name))
    }

    /// Nearest method with the given name in the class chain
    pub fn find_method(&self, name: &str) -> Option<&Method> {
        self.ancestry().find_map(|level| level.methods.get(name))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("parent", &self.parent.as_ref().and_then(|p| p.name()))
            .finish()
    }
}

/// Iterator over a class and its ancestors
pub struct Ancestry<'a> {
    next: Option<&'a Class>,
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = &'a Class;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}

/// Builder for [`Class`]
pub struct ClassBuilder {
    name: Option<String>,
    parent: Arc<Class>,
    fields: Vec<(String, Value)>,
    accessors: IndexMap<String, Accessor>,
    methods: IndexMap<String, Method>,
}

impl ClassBuilder {
    fn new(name: Option<String>) -> Self {
        Self {
            name,
            parent: Class::root(),
            fields: Vec::new(),
            accessors: IndexMap::new(),
            methods: IndexMap::new(),
        }
    }

    /// Set the parent class (defaults to the root)
    pub fn extends(mut self, parent: &Arc<Class>) -> Self {
        self.parent = Arc::clone(parent);
        self
    }

    /// Declare a field that starts out unset
    pub fn field(self, name: impl Into<String>) -> Self {
        self.field_with(name, Value::Undefined)
    }

    /// Declare a field with an initial value
    pub fn field_with(mut self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        let name = name.into();
        let initial = initial.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, value)) => *value = initial,
            None => self.fields.push((name, initial)),
        }
        self
    }

    /// Declare a getter-backed computed property
    pub fn getter<F>(mut self, name: impl Into<String>, get: F) -> Self
    where
        F: Fn(&Object) -> Value + Send + Sync + 'static,
    {
        self.accessors.entry(name.into()).or_default().getter = Some(Arc::new(get));
        self
    }

    /// Declare a setter for a computed property
    pub fn setter<F>(mut self, name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&Object, Value) + Send + Sync + 'static,
    {
        self.accessors.entry(name.into()).or_default().setter = Some(Arc::new(set));
        self
    }

    /// Declare a method
    pub fn method<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Object, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(body));
        self
    }

    pub fn build(self) -> Arc<Class> {
        Arc::new(Class {
            id: NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            parent: Some(self.parent),
            fields: self.fields,
            accessors: self.accessors,
            methods: self.methods,
        })
    }
}

#[derive(Default)]
struct ObjectState {
    /// Own fields, in assignment order
    fields: IndexMap<String, Value>,
    /// Hidden-tier storage; never listed, never reachable by a view
    slots: HashMap<String, Value>,
}

struct ObjectInner {
    class: Arc<Class>,
    state: RwLock<ObjectState>,
}

/// Shared handle to an object instance
///
/// Cloning the handle does not copy the instance. Field access takes a short
/// internal lock that is never held while accessor or method code runs.
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

impl Object {
    /// Instantiate a class, assigning every declared field of the chain
    ///
    /// Ancestor declarations are applied first; a subclass redeclaring a
    /// field replaces its initial value.
    pub fn new(class: &Arc<Class>) -> Self {
        let mut levels: Vec<&Class> = class.ancestry().collect();
        levels.reverse();

        let mut fields = IndexMap::new();
        for level in levels {
            for (name, initial) in &level.fields {
                fields.insert(name.clone(), initial.clone());
            }
        }

        Self {
            inner: Arc::new(ObjectInner {
                class: Arc::clone(class),
                state: RwLock::new(ObjectState {
                    fields,
                    slots: HashMap::new(),
                }),
            }),
        }
    }

    /// A plain object of the root class
    pub fn plain() -> Self {
        Self::new(&Class::root())
    }

    pub fn class(&self) -> &Arc<Class> {
        &self.inner.class
    }

    /// Whether both handles refer to the same instance
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Names of the current own fields, in assignment order
    pub fn own_keys(&self) -> Vec<String> {
        self.inner.state.read().fields.keys().cloned().collect()
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.inner.state.read().fields.contains_key(name)
    }

    /// Read an own field directly, bypassing accessors
    pub fn field(&self, name: &str) -> Option<Value> {
        self.inner.state.read().fields.get(name).cloned()
    }

    /// Assign an own field directly, bypassing accessors
    pub fn set_field(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .state
            .write()
            .fields
            .insert(name.into(), value.into());
    }

    /// Read a hidden-tier slot
    ///
    /// Meant for the class's own accessors and methods.
    pub fn slot(&self, name: &str) -> Option<Value> {
        self.inner.state.read().slots.get(name).cloned()
    }

    /// Write a hidden-tier slot
    pub fn set_slot(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .state
            .write()
            .slots
            .insert(name.into(), value.into());
    }

    /// Whether `name` resolves to anything: own field, accessor or method
    pub fn has_property(&self, name: &str) -> bool {
        self.has_own(name)
            || self.class().find_accessor(name).is_some()
            || self.class().find_method(name).is_some()
    }

    /// Resolve `name` the way a property lookup would
    ///
    /// Own fields shadow accessors, accessors shadow methods. A setter-only
    /// accessor resolves to [`Value::Undefined`]. Methods come back bound to
    /// this instance. Returns `None` if nothing by that name is reachable.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.field(name) {
            return Some(value);
        }
        if let Some(accessor) = self.class().find_accessor(name) {
            return Some(match &accessor.getter {
                Some(get) => get(self),
                None => Value::Undefined,
            });
        }
        self.class()
            .find_method(name)
            .map(|method| Value::Function(BoundMethod::new(name, self.clone(), Arc::clone(method))))
    }

    /// Assign `name` the way a property assignment would
    ///
    /// Existing own fields are overwritten; otherwise the nearest accessor's
    /// setter is invoked; otherwise a new own field is created. Returns
    /// `false` when the nearest accessor has no setter.
    pub fn put(&self, name: &str, value: Value) -> bool {
        if self.has_own(name) {
            self.set_field(name, value);
            return true;
        }
        match self.class().find_accessor(name) {
            Some(accessor) => match &accessor.setter {
                Some(set) => {
                    set(self, value);
                    true
                }
                None => false,
            },
            None => {
                self.set_field(name, value);
                true
            }
        }
    }

    /// Descriptor of an own field, if there is one
    pub fn own_descriptor(&self, name: &str) -> Option<Descriptor> {
        self.field(name).map(|value| Descriptor::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        })
    }

    /// Call a method by name; `None` if there is no such method
    pub fn invoke(&self, name: &str, args: &[Value]) -> Option<Value> {
        let method = Arc::clone(self.class().find_method(name)?);
        Some(method(self, args))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.class().name().unwrap_or("<anonymous>");
        write!(f, "{} {{ {} }}", name, self.own_keys().join(", "))
    }
}

thread_local! {
    /// Objects currently being serialized on this thread, outermost first
    static SERIALIZING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks an object as being serialized until dropped
pub(crate) struct SerializeGuard {
    addr: usize,
}

impl Drop for SerializeGuard {
    fn drop(&mut self) {
        SERIALIZING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|addr| *addr == self.addr) {
                stack.remove(pos);
            }
        });
    }
}

impl Object {
    /// Enter serialization of this object; `None` if it is already being
    /// serialized further up the stack, i.e. the graph has a cycle
    pub(crate) fn enter_serialize(&self) -> Option<SerializeGuard> {
        let addr = Arc::as_ptr(&self.inner) as usize;
        SERIALIZING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&addr) {
                return None;
            }
            stack.push(addr);
            Some(SerializeGuard { addr })
        })
    }
}

/// Own fields only; absent values and functions are skipped
///
/// Fails on cyclic object graphs.
impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(_guard) = self.enter_serialize() else {
            return Err(S::Error::custom("cyclic object"));
        };
        let fields: Vec<(String, Value)> = self
            .inner
            .state
            .read()
            .fields
            .iter()
            .filter(|(_, v)| !v.is_undefined() && !v.is_callable())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, value) in &fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
