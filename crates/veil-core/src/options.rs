//! View policy options

use serde::{Deserialize, Serialize};

/// Policy flags for a [`View`](crate::View)
///
/// Every flag defaults to `false`. Field names deserialize in camelCase so
/// the same document can configure hosts written against other bindings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewOptions {
    /// Include `_`-prefixed names in the field set and allow reading/writing them
    pub allow_protected_field: bool,
    /// Reading a non-visible name fails instead of yielding `Undefined`
    pub allow_read_error: bool,
    /// Writing a non-visible name fails instead of being dropped
    pub allow_write_error: bool,
    /// Deleting is accepted as a no-op instead of failing
    pub disable_delete_error: bool,
    /// Skip the discovery cache
    pub disable_cache: bool,
}

impl ViewOptions {
    /// Options that fail loudly on every misuse
    pub fn strict() -> Self {
        Self {
            allow_read_error: true,
            allow_write_error: true,
            ..Default::default()
        }
    }

    pub fn with_allow_protected_field(mut self, allow: bool) -> Self {
        self.allow_protected_field = allow;
        self
    }

    pub fn with_allow_read_error(mut self, allow: bool) -> Self {
        self.allow_read_error = allow;
        self
    }

    pub fn with_allow_write_error(mut self, allow: bool) -> Self {
        self.allow_write_error = allow;
        self
    }

    pub fn with_disable_delete_error(mut self, disable: bool) -> Self {
        self.disable_delete_error = disable;
        self
    }

    pub fn with_disable_cache(mut self, disable: bool) -> Self {
        self.disable_cache = disable;
        self
    }

    /// Canonical string form, used as the policy half of a cache key
    ///
    /// Fields always appear in declaration order, so equal options always
    /// encode identically.
    pub fn canonical(&self) -> String {
        format!(
            "allowProtectedField={};allowReadError={};allowWriteError={};disableDeleteError={};disableCache={}",
            self.allow_protected_field,
            self.allow_read_error,
            self.allow_write_error,
            self.disable_delete_error,
            self.disable_cache,
        )
    }
}
