//! The platform interface.
//!
//! [`Platform`] is the capability surface device logic calls through. Every
//! backend implements it: the in-memory [`FakePlatform`](super::FakePlatform)
//! used for tests, and a kernel backend outside this crate.
//!
//! All calls are synchronous. A successful mutation has been absorbed into
//! the backend's cache, and its change notifications queued, by the time
//! the call returns.
//!
//! # Example
//!
//! ```ignore
//! use netplat::platform::{FakePlatform, Platform};
//! use netplat::platform::link::{BridgeLink, GenericLink};
//!
//! let mut platform = FakePlatform::new();
//! let br0 = platform.link_add(&BridgeLink::new("br0"))?.ifindex();
//! let eth0 = platform.link_add(&GenericLink::ethernet("eth0").up())?.ifindex();
//!
//! platform.link_attach_port(br0, eth0)?;
//! platform.link_set_up(br0)?;
//! assert!(platform.link_get(br0).unwrap().connected);
//! ```

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::cache::ObjectCache;
use super::error::Result;
use super::events::ChangeStream;
use super::interface_ref::InterfaceRef;
use super::link::LinkConfig;
use super::object::{
    Ip4Address, Ip4Route, Ip6Address, Ip6Route, Link, LinkPayload, ObjectRef, PlatformObject,
    PortData,
};
use super::types::link::iff;
use super::types::route::NlmFlags;

// ============================================================================
// Ethtool-style settings
// ============================================================================

/// Duplex mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Duplex {
    /// Half duplex.
    Half,
    /// Full duplex.
    Full,
    /// Unknown duplex.
    #[default]
    Unknown,
}

impl Duplex {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Half => "half",
            Self::Full => "full",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Duplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Speed, duplex and autonegotiation of a link.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LinkSettings {
    /// Autonegotiation enabled.
    pub autoneg: bool,
    /// Speed in Mb/s.
    pub speed: Option<u32>,
    pub duplex: Duplex,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            autoneg: true,
            speed: None,
            duplex: Duplex::Unknown,
        }
    }
}

impl LinkSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable autonegotiation.
    pub fn autoneg(mut self, enabled: bool) -> Self {
        self.autoneg = enabled;
        self
    }

    /// Force a speed (Mb/s).
    pub fn speed(mut self, speed: u32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn duplex(mut self, duplex: Duplex) -> Self {
        self.duplex = duplex;
        self
    }
}

impl fmt::Display for LinkSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "autoneg {}", if self.autoneg { "on" } else { "off" })?;
        if let Some(speed) = self.speed {
            write!(f, " speed {}Mb/s", speed)?;
        }
        write!(f, " duplex {}", self.duplex)
    }
}

/// 802.11 interface mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WifiMode {
    #[default]
    Unknown,
    Adhoc,
    Infra,
    Ap,
    Mesh,
}

impl WifiMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Adhoc => "adhoc",
            Self::Infra => "infra",
            Self::Ap => "ap",
            Self::Mesh => "mesh",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Unknown, Self::Adhoc, Self::Infra, Self::Ap, Self::Mesh]
            .into_iter()
            .find(|mode| mode.name() == name)
    }
}

impl fmt::Display for WifiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Platform trait
// ============================================================================

/// Operations every backend provides.
///
/// The trait is object safe so device logic can hold a
/// `&mut dyn Platform` without knowing the backend.
pub trait Platform {
    // ------------------------------------------------------------------------
    // Cache access
    // ------------------------------------------------------------------------

    /// The backend's object cache.
    fn cache(&self) -> &ObjectCache;

    /// Subscribe to cache changes. The queue is unbounded, so the
    /// consumer must keep draining it.
    fn subscribe(&mut self) -> ChangeStream;

    /// Subscribe with a queue of at most `capacity` changes. A subscriber
    /// that falls behind is dropped and reports
    /// [`ChangeStream::is_lagged`].
    fn subscribe_bounded(&mut self, capacity: usize) -> ChangeStream;

    /// Look up a link by ifindex.
    fn link_get(&self, ifindex: i32) -> Option<&Link> {
        self.cache().link_by_ifindex(ifindex)
    }

    /// Look up a link by name.
    fn link_get_by_name(&self, name: &str) -> Option<&Link> {
        self.cache().link_by_name(name)
    }

    /// Resolve an interface reference to an ifindex.
    fn resolve(&self, iface: &InterfaceRef) -> Result<i32> {
        iface.resolve(self.cache())
    }

    // ------------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------------

    /// Create a link. Returns the realized link.
    fn link_add(&mut self, config: &dyn LinkConfig) -> Result<ObjectRef>;

    /// Delete a link and everything that depends on it.
    fn link_delete(&mut self, ifindex: i32) -> Result<()>;

    /// Change interface flags: bits in `mask` are taken from `set`.
    fn link_change_flags(&mut self, ifindex: i32, mask: u32, set: u32) -> Result<()>;

    /// Set the link administratively up.
    fn link_set_up(&mut self, ifindex: i32) -> Result<()> {
        self.link_change_flags(ifindex, iff::UP, iff::UP)
    }

    /// Set the link administratively down.
    fn link_set_down(&mut self, ifindex: i32) -> Result<()> {
        self.link_change_flags(ifindex, iff::UP, 0)
    }

    fn link_set_address(&mut self, ifindex: i32, address: &[u8]) -> Result<()>;

    fn link_set_mtu(&mut self, ifindex: i32, mtu: u32) -> Result<()>;

    /// Attach `port` to the bridge, bond or team `controller`.
    fn link_attach_port(&mut self, controller: i32, port: i32) -> Result<()>;

    /// Release `port` from `controller`.
    fn link_release_port(&mut self, controller: i32, port: i32) -> Result<()>;

    /// Replace the port-role data of an attached port.
    fn link_change_port_data(&mut self, ifindex: i32, data: PortData) -> Result<()>;

    /// Replace the type payload of a link.
    fn link_change_payload(&mut self, ifindex: i32, payload: LinkPayload) -> Result<()>;

    // ------------------------------------------------------------------------
    // Addresses
    // ------------------------------------------------------------------------

    /// Add or update an IPv4 address. Lifetimes and flags come from the
    /// candidate.
    fn ip4_address_add(&mut self, address: Ip4Address) -> Result<()>;

    fn ip4_address_delete(
        &mut self,
        ifindex: i32,
        address: Ipv4Addr,
        plen: u8,
        peer: Option<Ipv4Addr>,
    ) -> Result<()>;

    /// Add or update an IPv6 address.
    fn ip6_address_add(&mut self, address: Ip6Address) -> Result<()>;

    fn ip6_address_delete(&mut self, ifindex: i32, address: Ipv6Addr, plen: u8) -> Result<()>;

    // ------------------------------------------------------------------------
    // Routes
    // ------------------------------------------------------------------------

    /// Add a route of either family.
    ///
    /// Only replace semantics are implemented: `flags` must contain
    /// [`NlmFlags::REPLACE`] and nothing but [`NlmFlags::CREATE`] besides.
    fn ip_route_add(&mut self, flags: NlmFlags, route: PlatformObject) -> Result<()>;

    /// Delete the route with the identity of `template`.
    fn ip_route_delete(&mut self, template: &PlatformObject) -> Result<()>;

    fn ip4_route_add(&mut self, flags: NlmFlags, route: Ip4Route) -> Result<()> {
        self.ip_route_add(flags, route.into())
    }

    fn ip6_route_add(&mut self, flags: NlmFlags, route: Ip6Route) -> Result<()> {
        self.ip_route_add(flags, route.into())
    }

    // ------------------------------------------------------------------------
    // Host integration
    // ------------------------------------------------------------------------

    /// Read a sysctl (`/proc/sys/...` or `/sys/class/net/<if>/...`).
    fn sysctl_get(&self, path: &str) -> Result<String>;

    fn sysctl_set(&mut self, path: &str, value: &str) -> Result<()>;

    fn link_get_settings(&self, ifindex: i32) -> Result<LinkSettings>;

    fn link_set_settings(&mut self, ifindex: i32, settings: &LinkSettings) -> Result<()>;

    fn wifi_get_mode(&self, ifindex: i32) -> Result<WifiMode>;

    fn wifi_set_mode(&mut self, ifindex: i32, mode: WifiMode) -> Result<()>;

    fn mesh_get_channel(&self, ifindex: i32) -> Result<u32>;

    fn mesh_set_channel(&mut self, ifindex: i32, channel: u32) -> Result<()>;

    fn mesh_set_ssid(&mut self, ifindex: i32, ssid: &[u8]) -> Result<()>;

    /// Create an infiniband partition (child link) of `parent`.
    fn infiniband_partition_add(&mut self, parent: i32, p_key: u16) -> Result<ObjectRef>;

    fn infiniband_partition_delete(&mut self, parent: i32, p_key: u16) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_settings_builder() {
        let settings = LinkSettings::new()
            .autoneg(false)
            .speed(1000)
            .duplex(Duplex::Full);
        assert_eq!(
            settings.to_string(),
            "autoneg off speed 1000Mb/s duplex full"
        );
        assert_eq!(LinkSettings::default().to_string(), "autoneg on duplex unknown");
    }

    #[test]
    fn test_wifi_mode_names() {
        assert_eq!(WifiMode::from_name("ap"), Some(WifiMode::Ap));
        assert_eq!(WifiMode::from_name("monitor"), None);
        assert_eq!(WifiMode::Infra.to_string(), "infra");
    }
}
