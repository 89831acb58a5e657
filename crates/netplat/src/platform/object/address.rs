//! IPv4 and IPv6 address objects.
//!
//! # Example
//!
//! ```ignore
//! use netplat::platform::object::Ip4Address;
//! use std::net::Ipv4Addr;
//!
//! let addr = Ip4Address::new(2, Ipv4Addr::new(192, 168, 1, 100), 24)
//!     .broadcast(Ipv4Addr::new(192, 168, 1, 255))
//!     .label("eth0:web");
//!
//! platform.ip4_address_add(addr)?;
//! ```

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::platform::types::addr::{INFINITY_LIFE_TIME, format_flags};

// ============================================================================
// IPv4 Address
// ============================================================================

/// An IPv4 address assigned to a link.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ip4Address {
    pub ifindex: i32,
    pub address: Ipv4Addr,
    pub plen: u8,
    /// Peer address for point-to-point links. `None` means the local
    /// address doubles as the peer, as the kernel reports it.
    pub peer_address: Option<Ipv4Addr>,
    pub broadcast: Option<Ipv4Addr>,
    /// Address label (max 15 chars).
    pub label: Option<String>,
    /// Valid lifetime in seconds.
    pub lifetime: u32,
    /// Preferred lifetime in seconds.
    pub preferred: u32,
    /// Address flags (IFA_F_*).
    pub flags: u32,
    /// Time the lifetimes were last refreshed, in seconds.
    pub timestamp: u32,
}

impl Ip4Address {
    /// Create a new IPv4 address with infinite lifetimes.
    pub fn new(ifindex: i32, address: Ipv4Addr, plen: u8) -> Self {
        Self {
            ifindex,
            address,
            plen,
            peer_address: None,
            broadcast: None,
            label: None,
            lifetime: INFINITY_LIFE_TIME,
            preferred: INFINITY_LIFE_TIME,
            flags: 0,
            timestamp: 0,
        }
    }

    /// Set the peer address.
    pub fn peer(mut self, peer: Ipv4Addr) -> Self {
        self.peer_address = Some(peer);
        self
    }

    /// Set the broadcast address.
    pub fn broadcast(mut self, broadcast: Ipv4Addr) -> Self {
        self.broadcast = Some(broadcast);
        self
    }

    /// Set the address label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set valid and preferred lifetimes.
    pub fn lifetimes(mut self, lifetime: u32, preferred: u32) -> Self {
        self.lifetime = lifetime;
        self.preferred = preferred;
        self
    }

    /// Set address flags (IFA_F_*).
    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// The peer address as the kernel sees it (the local address if unset).
    pub fn effective_peer(&self) -> Ipv4Addr {
        self.peer_address.unwrap_or(self.address)
    }

    /// Check if the address is permanent (both lifetimes infinite).
    pub fn is_permanent(&self) -> bool {
        self.lifetime == INFINITY_LIFE_TIME && self.preferred == INFINITY_LIFE_TIME
    }
}

impl fmt::Display for Ip4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inet {}", self.address)?;
        if let Some(peer) = self.peer_address.filter(|p| *p != self.address) {
            write!(f, " peer {}", peer)?;
        }
        write!(f, "/{}", self.plen)?;
        if let Some(brd) = self.broadcast {
            write!(f, " brd {}", brd)?;
        }
        write!(f, " dev {}", self.ifindex)?;
        if let Some(label) = &self.label {
            write!(f, " label {}", label)?;
        }
        for flag in format_flags(self.flags) {
            write!(f, " {}", flag)?;
        }
        fmt_lifetimes(f, self.lifetime, self.preferred)
    }
}

// ============================================================================
// IPv6 Address
// ============================================================================

/// An IPv6 address assigned to a link.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ip6Address {
    pub ifindex: i32,
    pub address: Ipv6Addr,
    pub plen: u8,
    pub peer_address: Option<Ipv6Addr>,
    pub lifetime: u32,
    pub preferred: u32,
    pub flags: u32,
    pub timestamp: u32,
}

impl Ip6Address {
    /// Create a new IPv6 address with infinite lifetimes.
    pub fn new(ifindex: i32, address: Ipv6Addr, plen: u8) -> Self {
        Self {
            ifindex,
            address,
            plen,
            peer_address: None,
            lifetime: INFINITY_LIFE_TIME,
            preferred: INFINITY_LIFE_TIME,
            flags: 0,
            timestamp: 0,
        }
    }

    /// Set the peer address.
    pub fn peer(mut self, peer: Ipv6Addr) -> Self {
        self.peer_address = Some(peer);
        self
    }

    /// Set valid and preferred lifetimes.
    pub fn lifetimes(mut self, lifetime: u32, preferred: u32) -> Self {
        self.lifetime = lifetime;
        self.preferred = preferred;
        self
    }

    /// Set address flags (IFA_F_*).
    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// The peer used for identity: `None` when unset, unspecified or equal
    /// to the local address.
    pub fn normalized_peer(&self) -> Option<Ipv6Addr> {
        self.peer_address
            .filter(|p| !p.is_unspecified() && *p != self.address)
    }

    /// Check if this is a link-local (fe80::/10) address.
    pub fn is_link_local(&self) -> bool {
        self.address.is_unicast_link_local()
    }

    pub fn is_permanent(&self) -> bool {
        self.lifetime == INFINITY_LIFE_TIME && self.preferred == INFINITY_LIFE_TIME
    }
}

impl fmt::Display for Ip6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inet6 {}", self.address)?;
        if let Some(peer) = self.normalized_peer() {
            write!(f, " peer {}", peer)?;
        }
        write!(f, "/{} dev {}", self.plen, self.ifindex)?;
        if self.is_link_local() {
            f.write_str(" scope link")?;
        }
        for flag in format_flags(self.flags) {
            write!(f, " {}", flag)?;
        }
        fmt_lifetimes(f, self.lifetime, self.preferred)
    }
}

fn fmt_lifetimes(f: &mut fmt::Formatter<'_>, lifetime: u32, preferred: u32) -> fmt::Result {
    let fmt_one = |v: u32| {
        if v == INFINITY_LIFE_TIME {
            "forever".to_string()
        } else {
            format!("{}sec", v)
        }
    };
    if lifetime == INFINITY_LIFE_TIME && preferred == INFINITY_LIFE_TIME {
        return Ok(());
    }
    write!(
        f,
        " valid_lft {} preferred_lft {}",
        fmt_one(lifetime),
        fmt_one(preferred)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::types::addr::ifa_flags;

    #[test]
    fn test_ip4_display() {
        let addr = Ip4Address::new(2, Ipv4Addr::new(10, 0, 0, 5), 24)
            .broadcast(Ipv4Addr::new(10, 0, 0, 255))
            .label("eth0:1");
        assert_eq!(
            addr.to_string(),
            "inet 10.0.0.5/24 brd 10.0.0.255 dev 2 label eth0:1"
        );
        assert!(addr.is_permanent());
        assert_eq!(addr.effective_peer(), addr.address);
    }

    #[test]
    fn test_ip6_normalized_peer() {
        let local: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let a = Ip6Address::new(2, local, 64);
        assert_eq!(a.normalized_peer(), None);
        assert_eq!(a.clone().peer(Ipv6Addr::UNSPECIFIED).normalized_peer(), None);
        assert_eq!(a.clone().peer(local).normalized_peer(), None);

        let peer: Ipv6Addr = "2001:db8::2".parse().unwrap();
        assert_eq!(a.peer(peer).normalized_peer(), Some(peer));
    }

    #[test]
    fn test_ip6_display() {
        let addr = Ip6Address::new(3, "fe80::fa:ce:b0:2".parse().unwrap(), 64)
            .flags(ifa_flags::PERMANENT)
            .lifetimes(3600, 1800);
        assert_eq!(
            addr.to_string(),
            "inet6 fe80::fa:ce:b0:2/64 dev 3 scope link permanent valid_lft 3600sec preferred_lft 1800sec"
        );
    }
}
