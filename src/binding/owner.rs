//! # Owner Keys
//!
//! Identity of the logical owner (a RemoteSecret) of a synchronized object.

use crate::constants::OWNER_KEY_SEPARATOR;
use std::fmt;

/// Namespaced identity of an object, rendered as `<namespace>/<name>`
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identity of a namespaced kube resource
    ///
    /// Returns `None` when the resource has no name or namespace yet.
    pub fn from_resource<R: kube::ResourceExt>(resource: &R) -> Option<Self> {
        let name = resource.meta().name.clone()?;
        let namespace = resource.namespace()?;
        Some(Self { namespace, name })
    }

    /// Parse the `<namespace>/<name>` form, splitting on the first separator
    ///
    /// Returns `None` when the separator is missing.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let (namespace, name) = value.split_once(OWNER_KEY_SEPARATOR)?;
        Some(Self::new(namespace, name))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.namespace, OWNER_KEY_SEPARATOR, self.name)
    }
}

impl std::str::FromStr for ObjectKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectKey::parse(s).ok_or_else(|| format!("'{s}' is not in the <namespace>/<name> form"))
    }
}
