//! # Veil Core
//!
//! Restricted views over dynamic objects.
//!
//! A [`View`] exposes only the public surface of an [`Object`]: its own
//! fields and the getter-backed properties declared along its class chain.
//! Names starting with `_` are protected and stay hidden unless the
//! [`ViewOptions`] allow them; hidden-tier slots are never reachable.
//!
//! ## Key Types
//!
//! - [`Class`] / [`Object`]: the dynamic object model views operate over
//! - [`FieldSet`]: discovered attribute names, see [`discover`]
//! - [`DiscoveryCache`]: field sets cached by class identity and options
//! - [`View`]: the access-controlled wrapper, see [`create_view`]
//!
//! ```ignore
//! use veil_core::{Class, Object, Value, create_view};
//!
//! let class = Class::builder("Account")
//!     .field("owner")
//!     .field_with("_balance", 0)
//!     .getter("label", |o| o.field("owner").unwrap_or_default())
//!     .build();
//! let account = Object::new(&class);
//! let view = create_view(&account, None);
//!
//! assert_eq!(view.list_fields(), vec!["owner", "label"]);
//! assert_eq!(view.get("_balance")?, Value::Undefined);
//! ```

pub mod cache;
pub mod discovery;
pub mod error;
pub mod object;
pub mod options;
pub mod value;
pub mod view;

// Re-export main types
pub use cache::DiscoveryCache;
pub use discovery::{FieldSet, PROTECTED_PREFIX, discover, is_protected};
pub use error::{Operation, VeilError, VeilResult};
pub use object::{Accessor, Class, ClassBuilder, Descriptor, Object};
pub use options::ViewOptions;
pub use value::{BoundMethod, Value};
pub use view::{View, create_view, create_view_with_cache};
