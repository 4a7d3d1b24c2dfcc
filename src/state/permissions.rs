//! Permission set with the `"*"` wildcard sentinel.

#[cfg(test)]
#[path = "permissions_test.rs"]
mod permissions_test;

use std::collections::BTreeSet;

/// Reserved permission granting every check.
pub const WILDCARD: &str = "*";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionSet {
    names: BTreeSet<String>,
}

impl PermissionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the set holds the wildcard or `permission` itself.
    #[must_use]
    pub fn allows(&self, permission: &str) -> bool {
        self.names.contains(WILDCARD) || self.names.contains(permission)
    }

    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.names.contains(WILDCARD)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { names: iter.into_iter().map(Into::into).collect() }
    }
}
