//! Object identity and ordering.
//!
//! Every cached object has exactly one [`ObjectId`]. Two objects with the
//! same id are "the same object" even if their content differs, which is
//! what lets the cache tell an update from an addition.
//!
//! Routes also have a weak identity that leaves out everything that
//! depends on the nexthop. Two routes with equal weak ids occupy the same
//! kernel slot, so absorbing one with replace semantics evicts the other.
//!
//! The derived `Ord` on [`ObjectId`] is the iteration order of the cache:
//! by object kind first, then by the fields of the id in declaration order.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::platform::object::{
    Ip4Address, Ip4Route, Ip6Address, Ip6Route, ObjectKind, RouteMetrics,
};
use crate::platform::types::route::{RouteScope, RouteType};
use crate::util::addr::{ipv4_network, ipv6_network};

/// Cache key of a platform object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectId {
    Link(i32),
    Ip4Address(Ip4AddressId),
    Ip6Address(Ip6AddressId),
    Ip4Route(Ip4RouteId),
    Ip6Route(Ip6RouteId),
    Ip4RouteWeak(Ip4RouteWeakId),
    Ip6RouteWeak(Ip6RouteWeakId),
}

impl ObjectId {
    /// The kind of object this id refers to.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Link(_) => ObjectKind::Link,
            Self::Ip4Address(_) => ObjectKind::Ip4Address,
            Self::Ip6Address(_) => ObjectKind::Ip6Address,
            Self::Ip4Route(_) | Self::Ip4RouteWeak(_) => ObjectKind::Ip4Route,
            Self::Ip6Route(_) | Self::Ip6RouteWeak(_) => ObjectKind::Ip6Route,
        }
    }

    /// Returns true for weak route ids.
    pub fn is_weak(&self) -> bool {
        matches!(self, Self::Ip4RouteWeak(_) | Self::Ip6RouteWeak(_))
    }

    /// The owning interface index, if the id carries one.
    ///
    /// Weak route ids do not include the interface.
    pub fn ifindex(&self) -> Option<i32> {
        match self {
            Self::Link(ifindex) => Some(*ifindex),
            Self::Ip4Address(id) => Some(id.ifindex),
            Self::Ip6Address(id) => Some(id.ifindex),
            Self::Ip4Route(id) => Some(id.ifindex),
            Self::Ip6Route(id) => Some(id.ifindex),
            Self::Ip4RouteWeak(_) | Self::Ip6RouteWeak(_) => None,
        }
    }

    /// The weak id of a strong route id. Other ids are returned unchanged.
    pub fn to_weak(&self) -> ObjectId {
        match self {
            Self::Ip4Route(id) => Self::Ip4RouteWeak(id.weak),
            Self::Ip6Route(id) => Self::Ip6RouteWeak(id.weak),
            other => *other,
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(ifindex) => write!(f, "link {}", ifindex),
            Self::Ip4Address(id) => {
                write!(f, "ip4-address {}/{} dev {}", id.address, id.plen, id.ifindex)?;
                if id.peer_network != ipv4_network(id.address, id.plen) {
                    write!(f, " peer-net {}", id.peer_network)?;
                }
                Ok(())
            }
            Self::Ip6Address(id) => {
                write!(f, "ip6-address {}/{} dev {}", id.address, id.plen, id.ifindex)?;
                if let Some(peer) = id.peer {
                    write!(f, " peer {}", peer)?;
                }
                Ok(())
            }
            Self::Ip4Route(id) => {
                write!(f, "ip4-route {}", id.weak)?;
                write!(f, " dev {}", id.ifindex)?;
                if id.gateway != Ipv4Addr::UNSPECIFIED {
                    write!(f, " via {}", id.gateway)?;
                }
                Ok(())
            }
            Self::Ip6Route(id) => {
                write!(f, "ip6-route {}", id.weak)?;
                write!(f, " dev {}", id.ifindex)?;
                if id.gateway != Ipv6Addr::UNSPECIFIED {
                    write!(f, " via {}", id.gateway)?;
                }
                Ok(())
            }
            Self::Ip4RouteWeak(id) => write!(f, "ip4-route-weak {}", id),
            Self::Ip6RouteWeak(id) => write!(f, "ip6-route-weak {}", id),
        }
    }
}

// ============================================================================
// Addresses
// ============================================================================

/// Identity of an IPv4 address.
///
/// The peer only counts by its network: two peers inside the same prefix
/// refer to the same kernel address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ip4AddressId {
    pub ifindex: i32,
    pub address: Ipv4Addr,
    pub plen: u8,
    pub peer_network: Ipv4Addr,
}

impl From<&Ip4Address> for Ip4AddressId {
    fn from(addr: &Ip4Address) -> Self {
        Self {
            ifindex: addr.ifindex,
            address: addr.address,
            plen: addr.plen,
            peer_network: ipv4_network(addr.effective_peer(), addr.plen),
        }
    }
}

/// Identity of an IPv6 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ip6AddressId {
    pub ifindex: i32,
    pub address: Ipv6Addr,
    pub plen: u8,
    /// Normalized peer; `None` when unset, `::`, or the local address.
    pub peer: Option<Ipv6Addr>,
}

impl From<&Ip6Address> for Ip6AddressId {
    fn from(addr: &Ip6Address) -> Self {
        Self {
            ifindex: addr.ifindex,
            address: addr.address,
            plen: addr.plen,
            peer: addr.normalized_peer(),
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Weak identity of an IPv4 route: the kernel's replace slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ip4RouteWeakId {
    pub route_type: RouteType,
    pub table: u32,
    pub network: Ipv4Addr,
    pub plen: u8,
    pub metric: u32,
    pub tos: u8,
}

impl fmt::Display for Ip4RouteWeakId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} table {} metric {} tos {}",
            self.route_type.name(),
            self.network,
            self.plen,
            self.table,
            self.metric,
            self.tos
        )
    }
}

/// Strong identity of an IPv4 route.
///
/// Embeds the weak id as its leading component so weak and strong ids
/// sort consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ip4RouteId {
    pub weak: Ip4RouteWeakId,
    pub ifindex: i32,
    pub gateway: Ipv4Addr,
    pub scope: RouteScope,
    pub pref_src: Ipv4Addr,
    pub metrics: RouteMetrics,
    pub onlink: bool,
}

impl From<&Ip4Route> for Ip4RouteWeakId {
    fn from(route: &Ip4Route) -> Self {
        Self {
            route_type: route.route_type,
            table: route.table,
            network: ipv4_network(route.network, route.plen),
            plen: route.plen,
            metric: route.metric,
            tos: route.tos,
        }
    }
}

impl From<&Ip4Route> for Ip4RouteId {
    fn from(route: &Ip4Route) -> Self {
        Self {
            weak: route.into(),
            ifindex: route.ifindex,
            gateway: route.gateway.unwrap_or(Ipv4Addr::UNSPECIFIED),
            scope: route.scope,
            pref_src: route.pref_src.unwrap_or(Ipv4Addr::UNSPECIFIED),
            metrics: route.metrics,
            onlink: route.onlink,
        }
    }
}

/// Weak identity of an IPv6 route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ip6RouteWeakId {
    pub route_type: RouteType,
    pub table: u32,
    pub network: Ipv6Addr,
    pub plen: u8,
    pub metric: u32,
    pub src: Ipv6Addr,
    pub src_plen: u8,
}

impl fmt::Display for Ip6RouteWeakId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} table {} metric {}",
            self.route_type.name(),
            self.network,
            self.plen,
            self.table,
            self.metric
        )?;
        if self.src_plen > 0 {
            write!(f, " from {}/{}", self.src, self.src_plen)?;
        }
        Ok(())
    }
}

/// Strong identity of an IPv6 route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ip6RouteId {
    pub weak: Ip6RouteWeakId,
    pub ifindex: i32,
    pub gateway: Ipv6Addr,
    pub pref_src: Ipv6Addr,
    pub metrics: RouteMetrics,
}

impl From<&Ip6Route> for Ip6RouteWeakId {
    fn from(route: &Ip6Route) -> Self {
        Self {
            route_type: route.route_type,
            table: route.table,
            network: ipv6_network(route.network, route.plen),
            plen: route.plen,
            metric: route.metric,
            src: ipv6_network(route.src, route.src_plen),
            src_plen: route.src_plen,
        }
    }
}

impl From<&Ip6Route> for Ip6RouteId {
    fn from(route: &Ip6Route) -> Self {
        Self {
            weak: route.into(),
            ifindex: route.ifindex,
            gateway: route.gateway.unwrap_or(Ipv6Addr::UNSPECIFIED),
            pref_src: route.pref_src.unwrap_or(Ipv6Addr::UNSPECIFIED),
            metrics: route.metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip4_address_peer_masked() {
        let base = Ip4Address::new(2, Ipv4Addr::new(10, 0, 0, 1), 24);
        let a = Ip4AddressId::from(&base.clone().peer(Ipv4Addr::new(10, 0, 0, 7)));
        let b = Ip4AddressId::from(&base.clone().peer(Ipv4Addr::new(10, 0, 0, 9)));
        let c = Ip4AddressId::from(&base.clone().peer(Ipv4Addr::new(10, 0, 1, 9)));
        assert_eq!(a, b);
        assert_ne!(a, c);

        // No peer is the same as peer == address.
        assert_eq!(
            Ip4AddressId::from(&base),
            Ip4AddressId::from(&base.clone().peer(Ipv4Addr::new(10, 0, 0, 1)))
        );
    }

    #[test]
    fn test_ip6_address_peer_normalized() {
        let local: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let a = Ip6Address::new(2, local, 64);
        assert_eq!(
            Ip6AddressId::from(&a),
            Ip6AddressId::from(&a.clone().peer(Ipv6Addr::UNSPECIFIED))
        );
        assert_eq!(
            Ip6AddressId::from(&a),
            Ip6AddressId::from(&a.clone().peer(local))
        );
    }

    #[test]
    fn test_route_weak_ignores_nexthop() {
        let r1 = Ip4Route::new(Ipv4Addr::UNSPECIFIED, 0)
            .ifindex(2)
            .gateway(Ipv4Addr::new(10, 0, 0, 1));
        let r2 = Ip4Route::new(Ipv4Addr::UNSPECIFIED, 0)
            .ifindex(3)
            .gateway(Ipv4Addr::new(10, 0, 1, 1));

        assert_ne!(Ip4RouteId::from(&r1), Ip4RouteId::from(&r2));
        assert_eq!(Ip4RouteWeakId::from(&r1), Ip4RouteWeakId::from(&r2));

        let r3 = r1.clone().metric(200);
        assert_ne!(Ip4RouteWeakId::from(&r1), Ip4RouteWeakId::from(&r3));
    }

    #[test]
    fn test_route_network_masked() {
        let a = Ip4Route::new(Ipv4Addr::new(10, 0, 0, 5), 24).ifindex(2);
        let b = Ip4Route::new(Ipv4Addr::new(10, 0, 0, 0), 24).ifindex(2);
        assert_eq!(Ip4RouteId::from(&a), Ip4RouteId::from(&b));

        let a = Ip6Route::new("2001:db8::5".parse().unwrap(), 64).ifindex(2);
        let b = Ip6Route::new("2001:db8::".parse().unwrap(), 64).ifindex(2);
        assert_eq!(Ip6RouteId::from(&a), Ip6RouteId::from(&b));
    }

    #[test]
    fn test_id_order_by_kind() {
        let link = ObjectId::Link(100);
        let addr = ObjectId::Ip4Address(Ip4AddressId::from(&Ip4Address::new(
            1,
            Ipv4Addr::LOCALHOST,
            8,
        )));
        assert!(link < addr);
        assert_eq!(addr.kind(), ObjectKind::Ip4Address);
        assert_eq!(addr.ifindex(), Some(1));
    }
}
