//! Interface references.
//!
//! Device logic often knows an interface by name (from a profile) while
//! the cache is keyed by ifindex. [`InterfaceRef`] holds either and is
//! resolved against the cache at the point of use.
//!
//! # Example
//!
//! ```ignore
//! use netplat::platform::InterfaceRef;
//!
//! let ifindex = InterfaceRef::from("eth0").resolve(platform.cache())?;
//! let same = InterfaceRef::index(ifindex).resolve(platform.cache())?;
//! ```

use std::fmt;

use super::cache::ObjectCache;
use super::error::{Error, Result};
use super::object::Link;

/// A reference to a network interface, either by name or by index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InterfaceRef {
    /// Interface specified by name.
    Name(String),
    /// Interface specified by ifindex.
    Index(i32),
}

impl InterfaceRef {
    #[inline]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    #[inline]
    pub fn index(index: i32) -> Self {
        Self::Index(index)
    }

    /// Get the name if this is a name reference.
    #[inline]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Index(_) => None,
        }
    }

    /// Get the index if this is an index reference.
    #[inline]
    pub fn as_index(&self) -> Option<i32> {
        match self {
            Self::Name(_) => None,
            Self::Index(idx) => Some(*idx),
        }
    }

    /// Look up the referenced link in `cache`.
    pub fn lookup<'a>(&self, cache: &'a ObjectCache) -> Result<&'a Link> {
        match self {
            Self::Name(name) => cache
                .link_by_name(name)
                .ok_or_else(|| Error::InterfaceNotFound { name: name.clone() }),
            Self::Index(ifindex) => cache
                .link_by_ifindex(*ifindex)
                .ok_or(Error::LinkNotFound { ifindex: *ifindex }),
        }
    }

    /// Resolve to an ifindex of a link present in `cache`.
    pub fn resolve(&self, cache: &ObjectCache) -> Result<i32> {
        self.lookup(cache).map(|link| link.ifindex)
    }
}

impl fmt::Display for InterfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{}", name),
            Self::Index(idx) => write!(f, "ifindex:{}", idx),
        }
    }
}

impl From<&str> for InterfaceRef {
    #[inline]
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for InterfaceRef {
    #[inline]
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<i32> for InterfaceRef {
    #[inline]
    fn from(index: i32) -> Self {
        Self::Index(index)
    }
}

impl From<&Link> for InterfaceRef {
    #[inline]
    fn from(link: &Link) -> Self {
        Self::Index(link.ifindex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::object::PlatformObject;
    use crate::platform::types::link::LinkKind;
    use crate::platform::types::route::NlmFlags;

    fn cache_with_eth0() -> ObjectCache {
        let mut cache = ObjectCache::new();
        let link = Link::new("eth0", LinkKind::Ethernet).with_ifindex(4);
        cache
            .absorb(PlatformObject::from(link).into_ref(), false, NlmFlags::NONE)
            .unwrap();
        cache
    }

    #[test]
    fn test_resolve() {
        let cache = cache_with_eth0();
        assert_eq!(InterfaceRef::from("eth0").resolve(&cache).unwrap(), 4);
        assert_eq!(InterfaceRef::from(4).resolve(&cache).unwrap(), 4);
    }

    #[test]
    fn test_resolve_missing() {
        let cache = cache_with_eth0();
        let err = InterfaceRef::name("eth9").resolve(&cache).unwrap_err();
        assert!(matches!(err, Error::InterfaceNotFound { .. }));
        let err = InterfaceRef::index(9).resolve(&cache).unwrap_err();
        assert!(matches!(err, Error::LinkNotFound { ifindex: 9 }));
    }

    #[test]
    fn test_display() {
        assert_eq!(InterfaceRef::name("br0").to_string(), "br0");
        assert_eq!(InterfaceRef::index(7).to_string(), "ifindex:7");
        assert_eq!(InterfaceRef::index(7).as_name(), None);
    }
}
