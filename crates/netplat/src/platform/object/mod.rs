//! Platform objects.
//!
//! A [`PlatformObject`] is one piece of kernel network state. Objects are
//! plain values: once handed to the cache they are shared as [`ObjectRef`]
//! and never mutated in place. To change an object, clone it, edit the
//! clone and absorb it again.
//!
//! # Example
//!
//! ```ignore
//! use netplat::platform::object::{Link, PlatformObject};
//! use netplat::platform::types::link::{LinkKind, iff};
//!
//! let current = cache.link_by_ifindex(2).unwrap();
//! let mut next = current.clone();
//! next.flags |= iff::UP;
//! let update = cache.absorb(PlatformObject::from(next).into_ref(), false, NlmFlags::NONE)?;
//! ```

mod address;
mod link;
pub mod payload;
mod route;

use std::fmt;
use std::sync::Arc;

pub use address::{Ip4Address, Ip6Address};
pub use link::{DEFAULT_MTU, Link};
pub use payload::{LinkPayload, PortData};
pub use route::{Ip4Route, Ip6Route, RouteMetrics};

use super::error::{Error, Result};
use super::id::{Ip4AddressId, Ip4RouteId, Ip6AddressId, Ip6RouteId, ObjectId};
use crate::util::ifname;

/// Shared handle to an object held by the cache.
pub type ObjectRef = Arc<PlatformObject>;

/// The kind of a platform object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ObjectKind {
    Link,
    Ip4Address,
    Ip6Address,
    Ip4Route,
    Ip6Route,
}

impl ObjectKind {
    /// Every kind, in cache iteration order.
    pub const ALL: [ObjectKind; 5] = [
        Self::Link,
        Self::Ip4Address,
        Self::Ip6Address,
        Self::Ip4Route,
        Self::Ip6Route,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Ip4Address => "ip4-address",
            Self::Ip6Address => "ip6-address",
            Self::Ip4Route => "ip4-route",
            Self::Ip6Route => "ip6-route",
        }
    }

    /// Parse a kind from its name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    pub fn is_route(&self) -> bool {
        matches!(self, Self::Ip4Route | Self::Ip6Route)
    }

    pub fn is_address(&self) -> bool {
        matches!(self, Self::Ip4Address | Self::Ip6Address)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One piece of kernel network state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "object", rename_all = "kebab-case"))]
pub enum PlatformObject {
    Link(Link),
    Ip4Address(Ip4Address),
    Ip6Address(Ip6Address),
    Ip4Route(Ip4Route),
    Ip6Route(Ip6Route),
}

impl PlatformObject {
    /// Wrap this object in a shared handle.
    pub fn into_ref(self) -> ObjectRef {
        Arc::new(self)
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Link(_) => ObjectKind::Link,
            Self::Ip4Address(_) => ObjectKind::Ip4Address,
            Self::Ip6Address(_) => ObjectKind::Ip6Address,
            Self::Ip4Route(_) => ObjectKind::Ip4Route,
            Self::Ip6Route(_) => ObjectKind::Ip6Route,
        }
    }

    /// The cache key of this object.
    pub fn identity(&self) -> ObjectId {
        match self {
            Self::Link(link) => ObjectId::Link(link.ifindex),
            Self::Ip4Address(addr) => ObjectId::Ip4Address(Ip4AddressId::from(addr)),
            Self::Ip6Address(addr) => ObjectId::Ip6Address(Ip6AddressId::from(addr)),
            Self::Ip4Route(route) => ObjectId::Ip4Route(Ip4RouteId::from(route)),
            Self::Ip6Route(route) => ObjectId::Ip6Route(Ip6RouteId::from(route)),
        }
    }

    /// The weak identity for routes; the identity for everything else.
    pub fn weak_identity(&self) -> ObjectId {
        self.identity().to_weak()
    }

    /// Check whether two objects share an identity.
    pub fn same_identity(&self, other: &PlatformObject) -> bool {
        self.identity() == other.identity()
    }

    /// The interface this object belongs to (0 for device-less routes).
    pub fn ifindex(&self) -> i32 {
        match self {
            Self::Link(link) => link.ifindex,
            Self::Ip4Address(addr) => addr.ifindex,
            Self::Ip6Address(addr) => addr.ifindex,
            Self::Ip4Route(route) => route.ifindex,
            Self::Ip6Route(route) => route.ifindex,
        }
    }

    /// Check that the object can be used as a cache key.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Link(link) => {
                if link.ifindex <= 0 {
                    return Err(Error::InvalidObject(format!(
                        "link {} has no ifindex",
                        link.name
                    )));
                }
                ifname::validate(&link.name)
                    .map_err(|e| Error::InvalidObject(e.to_string()))?;
            }
            Self::Ip4Address(addr) => {
                check_ifindex(addr.ifindex, "ip4 address")?;
                check_plen(addr.plen, 32, "ip4 address")?;
            }
            Self::Ip6Address(addr) => {
                check_ifindex(addr.ifindex, "ip6 address")?;
                check_plen(addr.plen, 128, "ip6 address")?;
            }
            Self::Ip4Route(route) => {
                if route.route_type.needs_ifindex() {
                    check_ifindex(route.ifindex, "ip4 route")?;
                }
                check_plen(route.plen, 32, "ip4 route")?;
            }
            Self::Ip6Route(route) => {
                if route.route_type.needs_ifindex() {
                    check_ifindex(route.ifindex, "ip6 route")?;
                }
                check_plen(route.plen, 128, "ip6 route")?;
                check_plen(route.src_plen, 128, "ip6 route source")?;
            }
        }
        Ok(())
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Self::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_ip4_address(&self) -> Option<&Ip4Address> {
        match self {
            Self::Ip4Address(addr) => Some(addr),
            _ => None,
        }
    }

    pub fn as_ip6_address(&self) -> Option<&Ip6Address> {
        match self {
            Self::Ip6Address(addr) => Some(addr),
            _ => None,
        }
    }

    pub fn as_ip4_route(&self) -> Option<&Ip4Route> {
        match self {
            Self::Ip4Route(route) => Some(route),
            _ => None,
        }
    }

    pub fn as_ip6_route(&self) -> Option<&Ip6Route> {
        match self {
            Self::Ip6Route(route) => Some(route),
            _ => None,
        }
    }
}

fn check_ifindex(ifindex: i32, what: &str) -> Result<()> {
    if ifindex <= 0 {
        return Err(Error::InvalidObject(format!(
            "{} requires ifindex > 0, got {}",
            what, ifindex
        )));
    }
    Ok(())
}

fn check_plen(plen: u8, max: u8, what: &str) -> Result<()> {
    if plen > max {
        return Err(Error::InvalidObject(format!(
            "{} prefix length {} exceeds {}",
            what, plen, max
        )));
    }
    Ok(())
}

impl fmt::Display for PlatformObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(link) => fmt::Display::fmt(link, f),
            Self::Ip4Address(addr) => fmt::Display::fmt(addr, f),
            Self::Ip6Address(addr) => fmt::Display::fmt(addr, f),
            Self::Ip4Route(route) => fmt::Display::fmt(route, f),
            Self::Ip6Route(route) => fmt::Display::fmt(route, f),
        }
    }
}

impl From<Link> for PlatformObject {
    fn from(link: Link) -> Self {
        Self::Link(link)
    }
}

impl From<Ip4Address> for PlatformObject {
    fn from(addr: Ip4Address) -> Self {
        Self::Ip4Address(addr)
    }
}

impl From<Ip6Address> for PlatformObject {
    fn from(addr: Ip6Address) -> Self {
        Self::Ip6Address(addr)
    }
}

impl From<Ip4Route> for PlatformObject {
    fn from(route: Ip4Route) -> Self {
        Self::Ip4Route(route)
    }
}

impl From<Ip6Route> for PlatformObject {
    fn from(route: Ip6Route) -> Self {
        Self::Ip6Route(route)
    }
}
