//! Link creation builders.
//!
//! Each builder describes a link to create and turns it into an unrealized
//! [`Link`] candidate (ifindex 0). The backend resolves the parent, assigns
//! the ifindex and absorbs the result.
//!
//! # Supported Link Types
//!
//! - [`GenericLink`] - ethernet, dummy, team, wifi and other payload-less kinds
//! - [`BridgeLink`] - Bridge interface
//! - [`BondLink`] - Bond interface
//! - [`VlanLink`] - VLAN interface
//! - [`VxlanLink`] - VXLAN overlay interface
//! - [`GreLink`] - GRE / GRETAP tunnel
//! - [`SitLink`] - IPv6-in-IPv4 tunnel
//! - [`IpipLink`] - IPv4-in-IPv4 tunnel
//! - [`Ip6TnlLink`] - IPv6 tunnel
//! - [`Ip6GreLink`] - IPv6 GRE / GRETAP tunnel
//! - [`VtiLink`] - Virtual Tunnel Interface (IPv4 IPsec)
//! - [`Vti6Link`] - Virtual Tunnel Interface (IPv6 IPsec)
//! - [`MacsecLink`] - MACsec interface
//!
//! # Example
//!
//! ```ignore
//! use netplat::platform::link::{BridgeLink, GenericLink, VlanLink};
//!
//! platform.link_add(&BridgeLink::new("br0").stp(true))?;
//! platform.link_add(&GenericLink::ethernet("eth0").up())?;
//! platform.link_add(&VlanLink::new("eth0.100", "eth0", 100))?;
//! ```

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::error::{Error, Result};
use super::interface_ref::InterfaceRef;
use super::object::Link;
use super::object::payload::{
    BondData, BondMode, BridgeData, ETH_P_8021AD, GreData, Ip6TnlData, IpipData, LinkPayload,
    MacsecData, MacsecValidation, SitData, VlanData, VtiData, Vti6Data, VxlanData, vlan_flags,
};
use super::types::link::{LinkKind, iff};
use crate::util::ifname;

/// GRE key present flag (GRE_KEY), host byte order.
pub const GRE_KEY: u16 = 0x2000;

/// Largest VLAN id usable on a link.
pub const VLAN_ID_MAX: u16 = 4094;

/// Largest VXLAN network identifier (24 bits).
pub const VXLAN_VNI_MAX: u32 = (1 << 24) - 1;

/// Trait for link configurations that can be added to a platform.
pub trait LinkConfig {
    /// Get the name of this interface.
    fn name(&self) -> &str;

    /// Get the kind of link this creates.
    fn kind(&self) -> LinkKind;

    /// The lower device this link is stacked on, if any.
    fn parent(&self) -> Option<&InterfaceRef> {
        None
    }

    /// Build the unrealized link candidate.
    ///
    /// The returned link has ifindex 0 and parent 0; the backend fills
    /// both in.
    fn build(&self) -> Result<Link>;
}

/// Validate the common fields and create the base link.
fn base_link(
    name: &str,
    kind: LinkKind,
    mtu: Option<u32>,
    address: Option<[u8; 6]>,
    up: bool,
) -> Result<Link> {
    ifname::validate(name).map_err(|e| Error::InvalidArgument(e.to_string()))?;

    let mut link = Link::new(name, kind);
    if let Some(mtu) = mtu {
        if mtu == 0 {
            return Err(Error::InvalidArgument(format!("{}: mtu must be > 0", name)));
        }
        link.mtu = mtu;
    }
    link.address = address.map(|addr| addr.to_vec());
    if up {
        link.flags |= iff::UP;
    }
    Ok(link)
}

// ============================================================================
// Generic Link
// ============================================================================

/// Configuration for a link without a type payload.
///
/// # Example
///
/// ```ignore
/// use netplat::platform::link::GenericLink;
///
/// let eth = GenericLink::ethernet("eth0")
///     .address([0x02, 0, 0, 0, 0, 0x01])
///     .mtu(9000)
///     .up();
///
/// platform.link_add(&eth)?;
/// ```
#[derive(Debug, Clone)]
pub struct GenericLink {
    name: String,
    kind: LinkKind,
    parent: Option<InterfaceRef>,
    mtu: Option<u32>,
    address: Option<[u8; 6]>,
    up: bool,
}

impl GenericLink {
    /// Create a new link configuration of any kind.
    pub fn new(name: impl Into<String>, kind: LinkKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            mtu: None,
            address: None,
            up: false,
        }
    }

    /// Ethernet device.
    pub fn ethernet(name: impl Into<String>) -> Self {
        Self::new(name, LinkKind::Ethernet)
    }

    /// Dummy device.
    pub fn dummy(name: impl Into<String>) -> Self {
        Self::new(name, LinkKind::Dummy)
    }

    /// Team controller.
    pub fn team(name: impl Into<String>) -> Self {
        Self::new(name, LinkKind::Team)
    }

    /// Wi-Fi device.
    pub fn wifi(name: impl Into<String>) -> Self {
        Self::new(name, LinkKind::Wifi)
    }

    /// Set the lower device.
    pub fn parent(mut self, parent: impl Into<InterfaceRef>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the MTU.
    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    /// Set the MAC address.
    pub fn address(mut self, addr: [u8; 6]) -> Self {
        self.address = Some(addr);
        self
    }

    /// Create the link administratively up.
    pub fn up(mut self) -> Self {
        self.up = true;
        self
    }
}

impl LinkConfig for GenericLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LinkKind {
        self.kind
    }

    fn parent(&self) -> Option<&InterfaceRef> {
        self.parent.as_ref()
    }

    fn build(&self) -> Result<Link> {
        if self.kind == LinkKind::Unknown {
            return Err(Error::InvalidArgument(format!(
                "{}: link kind must be known",
                self.name
            )));
        }
        base_link(&self.name, self.kind, self.mtu, self.address, self.up)
    }
}

// ============================================================================
// Bridge Link
// ============================================================================

/// Configuration for a bridge interface.
///
/// # Example
///
/// ```ignore
/// use netplat::platform::link::BridgeLink;
///
/// let bridge = BridgeLink::new("br0")
///     .stp(true)
///     .vlan_filtering(true)
///     .vlan_default_pvid(10);
///
/// platform.link_add(&bridge)?;
/// ```
#[derive(Debug, Clone)]
pub struct BridgeLink {
    name: String,
    mtu: Option<u32>,
    address: Option<[u8; 6]>,
    up: bool,
    data: BridgeData,
}

impl BridgeLink {
    /// Create a new bridge interface configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mtu: None,
            address: None,
            up: false,
            data: BridgeData::default(),
        }
    }

    /// Set the MTU.
    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    /// Set the MAC address.
    pub fn address(mut self, addr: [u8; 6]) -> Self {
        self.address = Some(addr);
        self
    }

    /// Create the bridge administratively up.
    pub fn up(mut self) -> Self {
        self.up = true;
        self
    }

    /// Enable or disable STP.
    pub fn stp(mut self, enabled: bool) -> Self {
        self.data.stp_state = enabled;
        self
    }

    /// Set the forward delay in milliseconds.
    pub fn forward_delay_ms(mut self, ms: u32) -> Self {
        // Stored in centiseconds
        self.data.forward_delay = ms / 10;
        self
    }

    /// Set the hello time in milliseconds.
    pub fn hello_time_ms(mut self, ms: u32) -> Self {
        self.data.hello_time = ms / 10;
        self
    }

    /// Set the max age in milliseconds.
    pub fn max_age_ms(mut self, ms: u32) -> Self {
        self.data.max_age = ms / 10;
        self
    }

    /// Set the ageing time in seconds.
    pub fn ageing_time(mut self, seconds: u32) -> Self {
        self.data.ageing_time = seconds * 100;
        self
    }

    /// Set the bridge priority.
    pub fn priority(mut self, priority: u16) -> Self {
        self.data.priority = priority;
        self
    }

    /// Enable or disable VLAN filtering.
    pub fn vlan_filtering(mut self, enabled: bool) -> Self {
        self.data.vlan_filtering = enabled;
        self
    }

    /// Set the default PVID (port VLAN ID).
    pub fn vlan_default_pvid(mut self, pvid: u16) -> Self {
        self.data.default_pvid = pvid;
        self
    }

    /// Use 802.1ad instead of 802.1Q for VLAN filtering.
    pub fn vlan_protocol_8021ad(mut self) -> Self {
        self.data.vlan_protocol = ETH_P_8021AD;
        self
    }

    /// Enable or disable multicast snooping.
    pub fn multicast_snooping(mut self, enabled: bool) -> Self {
        self.data.multicast_snooping = enabled;
        self
    }
}

impl LinkConfig for BridgeLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Bridge
    }

    fn build(&self) -> Result<Link> {
        if self.data.default_pvid > VLAN_ID_MAX {
            return Err(Error::InvalidArgument(format!(
                "{}: default pvid {} out of range",
                self.name, self.data.default_pvid
            )));
        }
        Ok(
            base_link(&self.name, LinkKind::Bridge, self.mtu, self.address, self.up)?
                .with_payload(LinkPayload::Bridge(self.data.clone())),
        )
    }
}

// ============================================================================
// Bond Link
// ============================================================================

/// Configuration for a bond interface.
///
/// # Example
///
/// ```ignore
/// use netplat::platform::link::BondLink;
/// use netplat::platform::object::payload::BondMode;
///
/// let bond = BondLink::new("bond0")
///     .mode(BondMode::ActiveBackup)
///     .miimon(100);
///
/// platform.link_add(&bond)?;
/// ```
#[derive(Debug, Clone)]
pub struct BondLink {
    name: String,
    mtu: Option<u32>,
    address: Option<[u8; 6]>,
    up: bool,
    data: BondData,
}

impl BondLink {
    /// Create a new bond interface configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mtu: None,
            address: None,
            up: false,
            data: BondData::default(),
        }
    }

    /// Set the MTU.
    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    /// Set the MAC address.
    pub fn address(mut self, addr: [u8; 6]) -> Self {
        self.address = Some(addr);
        self
    }

    /// Create the bond administratively up.
    pub fn up(mut self) -> Self {
        self.up = true;
        self
    }

    /// Set the bonding mode.
    pub fn mode(mut self, mode: BondMode) -> Self {
        self.data.mode = mode;
        self
    }

    /// Set the MII link monitoring interval in milliseconds.
    pub fn miimon(mut self, ms: u32) -> Self {
        self.data.miimon = ms;
        self
    }

    /// Set the up/down delays in milliseconds.
    pub fn delays(mut self, updelay: u32, downdelay: u32) -> Self {
        self.data.updelay = updelay;
        self.data.downdelay = downdelay;
        self
    }

    /// Set the minimum number of active ports.
    pub fn min_links(mut self, min_links: u32) -> Self {
        self.data.min_links = min_links;
        self
    }

    /// Set the transmit hash policy.
    pub fn xmit_hash_policy(mut self, policy: u8) -> Self {
        self.data.xmit_hash_policy = policy;
        self
    }
}

impl LinkConfig for BondLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Bond
    }

    fn build(&self) -> Result<Link> {
        Ok(
            base_link(&self.name, LinkKind::Bond, self.mtu, self.address, self.up)?
                .with_payload(LinkPayload::Bond(self.data.clone())),
        )
    }
}

// ============================================================================
// VLAN Link
// ============================================================================

/// Configuration for a VLAN interface.
///
/// # Example
///
/// ```ignore
/// use netplat::platform::link::VlanLink;
///
/// let vlan = VlanLink::new("eth0.100", "eth0", 100)
///     .gvrp(true)
///     .egress_map(0, 3);
///
/// platform.link_add(&vlan)?;
/// ```
#[derive(Debug, Clone)]
pub struct VlanLink {
    name: String,
    parent: InterfaceRef,
    mtu: Option<u32>,
    address: Option<[u8; 6]>,
    up: bool,
    data: VlanData,
}

impl VlanLink {
    /// Create a new VLAN interface configuration.
    pub fn new(name: impl Into<String>, parent: impl Into<InterfaceRef>, vlan_id: u16) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            mtu: None,
            address: None,
            up: false,
            data: VlanData {
                id: vlan_id,
                ..Default::default()
            },
        }
    }

    /// Set the MTU.
    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    /// Set the MAC address.
    pub fn address(mut self, addr: [u8; 6]) -> Self {
        self.address = Some(addr);
        self
    }

    /// Create the VLAN administratively up.
    pub fn up(mut self) -> Self {
        self.up = true;
        self
    }

    /// Use 802.1ad (QinQ) tagging.
    pub fn protocol_8021ad(mut self) -> Self {
        self.data.protocol = ETH_P_8021AD;
        self
    }

    /// Enable or disable header reordering.
    pub fn reorder_hdr(mut self, enabled: bool) -> Self {
        self.set_flag(vlan_flags::REORDER_HDR, enabled);
        self
    }

    /// Enable or disable GVRP.
    pub fn gvrp(mut self, enabled: bool) -> Self {
        self.set_flag(vlan_flags::GVRP, enabled);
        self
    }

    /// Enable or disable MVRP.
    pub fn mvrp(mut self, enabled: bool) -> Self {
        self.set_flag(vlan_flags::MVRP, enabled);
        self
    }

    /// Enable or disable loose binding to the parent's state.
    pub fn loose_binding(mut self, enabled: bool) -> Self {
        self.set_flag(vlan_flags::LOOSE_BINDING, enabled);
        self
    }

    /// Map an ingress skb priority to a VLAN priority.
    pub fn ingress_map(mut self, from: u32, to: u32) -> Self {
        self.data.ingress_qos_map.push((from, to));
        self
    }

    /// Map an egress skb priority to a VLAN priority.
    pub fn egress_map(mut self, from: u32, to: u32) -> Self {
        self.data.egress_qos_map.push((from, to));
        self
    }

    fn set_flag(&mut self, flag: u32, enabled: bool) {
        if enabled {
            self.data.flags |= flag;
        } else {
            self.data.flags &= !flag;
        }
    }
}

impl LinkConfig for VlanLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Vlan
    }

    fn parent(&self) -> Option<&InterfaceRef> {
        Some(&self.parent)
    }

    fn build(&self) -> Result<Link> {
        if self.data.id > VLAN_ID_MAX {
            return Err(Error::InvalidArgument(format!(
                "{}: vlan id {} out of range (0-{})",
                self.name, self.data.id, VLAN_ID_MAX
            )));
        }
        Ok(
            base_link(&self.name, LinkKind::Vlan, self.mtu, self.address, self.up)?
                .with_payload(LinkPayload::Vlan(self.data.clone())),
        )
    }
}

// ============================================================================
// VXLAN Link
// ============================================================================

/// Configuration for a VXLAN interface.
///
/// # Example
///
/// ```ignore
/// use netplat::platform::link::VxlanLink;
/// use std::net::Ipv4Addr;
///
/// let vxlan = VxlanLink::new("vxlan100", 100)
///     .parent("eth0")
///     .group(Ipv4Addr::new(239, 1, 1, 1).into())
///     .port(4789);
///
/// platform.link_add(&vxlan)?;
/// ```
#[derive(Debug, Clone)]
pub struct VxlanLink {
    name: String,
    parent: Option<InterfaceRef>,
    mtu: Option<u32>,
    address: Option<[u8; 6]>,
    up: bool,
    data: VxlanData,
}

impl VxlanLink {
    /// Create a new VXLAN interface configuration.
    pub fn new(name: impl Into<String>, vni: u32) -> Self {
        Self {
            name: name.into(),
            parent: None,
            mtu: None,
            address: None,
            up: false,
            data: VxlanData {
                id: vni,
                ..Default::default()
            },
        }
    }

    /// Set the underlay device.
    pub fn parent(mut self, parent: impl Into<InterfaceRef>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the MTU.
    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    /// Set the MAC address.
    pub fn address(mut self, addr: [u8; 6]) -> Self {
        self.address = Some(addr);
        self
    }

    /// Create the interface administratively up.
    pub fn up(mut self) -> Self {
        self.up = true;
        self
    }

    /// Set the multicast group (or unicast remote).
    pub fn group(mut self, group: IpAddr) -> Self {
        self.data.group = Some(group);
        self
    }

    /// Set the local source address.
    pub fn local(mut self, local: IpAddr) -> Self {
        self.data.local = Some(local);
        self
    }

    /// Set the destination UDP port.
    pub fn port(mut self, port: u16) -> Self {
        self.data.dst_port = port;
        self
    }

    /// Set the source UDP port range.
    pub fn port_range(mut self, min: u16, max: u16) -> Self {
        self.data.src_port_min = min;
        self.data.src_port_max = max;
        self
    }

    /// Set the TTL.
    pub fn ttl(mut self, ttl: u8) -> Self {
        self.data.ttl = ttl;
        self
    }

    /// Set the TOS.
    pub fn tos(mut self, tos: u8) -> Self {
        self.data.tos = tos;
        self
    }

    /// Enable or disable MAC learning.
    pub fn learning(mut self, enabled: bool) -> Self {
        self.data.learning = enabled;
        self
    }

    /// Set the FDB ageing time in seconds.
    pub fn ageing(mut self, seconds: u32) -> Self {
        self.data.ageing = seconds;
        self
    }

    /// Set the maximum number of FDB entries.
    pub fn limit(mut self, limit: u32) -> Self {
        self.data.limit = limit;
        self
    }

    /// Enable ARP proxy.
    pub fn proxy(mut self, enabled: bool) -> Self {
        self.data.proxy = enabled;
        self
    }

    /// Enable route short circuit.
    pub fn rsc(mut self, enabled: bool) -> Self {
        self.data.rsc = enabled;
        self
    }

    /// Enable L2 and L3 miss notifications.
    pub fn miss_notifications(mut self, l2miss: bool, l3miss: bool) -> Self {
        self.data.l2miss = l2miss;
        self.data.l3miss = l3miss;
        self
    }
}

impl LinkConfig for VxlanLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Vxlan
    }

    fn parent(&self) -> Option<&InterfaceRef> {
        self.parent.as_ref()
    }

    fn build(&self) -> Result<Link> {
        if self.data.id > VXLAN_VNI_MAX {
            return Err(Error::InvalidArgument(format!(
                "{}: vni {} exceeds 24 bits",
                self.name, self.data.id
            )));
        }
        if self.data.src_port_min > self.data.src_port_max {
            return Err(Error::InvalidArgument(format!(
                "{}: invalid source port range {}-{}",
                self.name, self.data.src_port_min, self.data.src_port_max
            )));
        }
        if let (Some(group), Some(local)) = (self.data.group, self.data.local)
            && group.is_ipv4() != local.is_ipv4()
        {
            return Err(Error::InvalidArgument(format!(
                "{}: group and local address families differ",
                self.name
            )));
        }
        Ok(
            base_link(&self.name, LinkKind::Vxlan, self.mtu, self.address, self.up)?
                .with_payload(LinkPayload::Vxlan(self.data.clone())),
        )
    }
}

// ============================================================================
// GRE Link
// ============================================================================

/// Configuration for a GRE or GRETAP tunnel.
///
/// # Example
///
/// ```ignore
/// use netplat::platform::link::GreLink;
/// use std::net::Ipv4Addr;
///
/// let gre = GreLink::new("gre1")
///     .local(Ipv4Addr::new(192, 0, 2, 1))
///     .remote(Ipv4Addr::new(198, 51, 100, 1))
///     .ikey(42)
///     .okey(42)
///     .ttl(64);
///
/// platform.link_add(&gre)?;
/// ```
#[derive(Debug, Clone)]
pub struct GreLink {
    name: String,
    parent: Option<InterfaceRef>,
    mtu: Option<u32>,
    up: bool,
    data: GreData,
}

impl GreLink {
    /// Create a new GRE tunnel configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            mtu: None,
            up: false,
            data: GreData::default(),
        }
    }

    /// Create a GRETAP (layer 2) tunnel.
    pub fn tap(mut self) -> Self {
        self.data.is_tap = true;
        self
    }

    /// Set the underlying device.
    pub fn parent(mut self, parent: impl Into<InterfaceRef>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the MTU.
    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    /// Create the tunnel administratively up.
    pub fn up(mut self) -> Self {
        self.up = true;
        self
    }

    /// Set the local endpoint.
    pub fn local(mut self, addr: Ipv4Addr) -> Self {
        self.data.local = addr;
        self
    }

    /// Set the remote endpoint.
    pub fn remote(mut self, addr: Ipv4Addr) -> Self {
        self.data.remote = addr;
        self
    }

    /// Set the input key.
    pub fn ikey(mut self, key: u32) -> Self {
        self.data.input_key = key;
        self.data.input_flags |= GRE_KEY;
        self
    }

    /// Set the output key.
    pub fn okey(mut self, key: u32) -> Self {
        self.data.output_key = key;
        self.data.output_flags |= GRE_KEY;
        self
    }

    /// Set the TTL (0 inherits).
    pub fn ttl(mut self, ttl: u8) -> Self {
        self.data.ttl = ttl;
        self
    }

    /// Set the TOS.
    pub fn tos(mut self, tos: u8) -> Self {
        self.data.tos = tos;
        self
    }

    /// Enable or disable path MTU discovery.
    pub fn pmtudisc(mut self, enabled: bool) -> Self {
        self.data.path_mtu_discovery = enabled;
        self
    }
}

impl LinkConfig for GreLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LinkKind {
        if self.data.is_tap {
            LinkKind::Gretap
        } else {
            LinkKind::Gre
        }
    }

    fn parent(&self) -> Option<&InterfaceRef> {
        self.parent.as_ref()
    }

    fn build(&self) -> Result<Link> {
        if self.data.ttl != 0 && !self.data.path_mtu_discovery {
            return Err(Error::InvalidArgument(format!(
                "{}: a fixed ttl requires path MTU discovery",
                self.name
            )));
        }
        Ok(base_link(&self.name, self.kind(), self.mtu, None, self.up)?
            .with_payload(LinkPayload::Gre(self.data.clone())))
    }
}

// ============================================================================
// SIT Link
// ============================================================================

/// Configuration for a SIT (IPv6-in-IPv4) tunnel.
#[derive(Debug, Clone)]
pub struct SitLink {
    name: String,
    parent: Option<InterfaceRef>,
    mtu: Option<u32>,
    up: bool,
    data: SitData,
}

impl SitLink {
    /// Create a new SIT tunnel configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            mtu: None,
            up: false,
            data: SitData {
                proto: libc::IPPROTO_IPV6 as u8,
                ..Default::default()
            },
        }
    }

    pub fn parent(mut self, parent: impl Into<InterfaceRef>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    pub fn up(mut self) -> Self {
        self.up = true;
        self
    }

    pub fn local(mut self, addr: Ipv4Addr) -> Self {
        self.data.local = addr;
        self
    }

    pub fn remote(mut self, addr: Ipv4Addr) -> Self {
        self.data.remote = addr;
        self
    }

    pub fn ttl(mut self, ttl: u8) -> Self {
        self.data.ttl = ttl;
        self
    }

    pub fn tos(mut self, tos: u8) -> Self {
        self.data.tos = tos;
        self
    }

    pub fn pmtudisc(mut self, enabled: bool) -> Self {
        self.data.path_mtu_discovery = enabled;
        self
    }

    /// Set SIT flags (ISATAP etc.).
    pub fn flags(mut self, flags: u16) -> Self {
        self.data.flags = flags;
        self
    }
}

impl LinkConfig for SitLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Sit
    }

    fn parent(&self) -> Option<&InterfaceRef> {
        self.parent.as_ref()
    }

    fn build(&self) -> Result<Link> {
        Ok(base_link(&self.name, LinkKind::Sit, self.mtu, None, self.up)?
            .with_payload(LinkPayload::Sit(self.data.clone())))
    }
}

// ============================================================================
// IPIP Link
// ============================================================================

/// Configuration for an IPIP (IPv4-in-IPv4) tunnel.
#[derive(Debug, Clone)]
pub struct IpipLink {
    name: String,
    parent: Option<InterfaceRef>,
    mtu: Option<u32>,
    up: bool,
    data: IpipData,
}

impl IpipLink {
    /// Create a new IPIP tunnel configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            mtu: None,
            up: false,
            data: IpipData::default(),
        }
    }

    pub fn parent(mut self, parent: impl Into<InterfaceRef>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    pub fn up(mut self) -> Self {
        self.up = true;
        self
    }

    pub fn local(mut self, addr: Ipv4Addr) -> Self {
        self.data.local = addr;
        self
    }

    pub fn remote(mut self, addr: Ipv4Addr) -> Self {
        self.data.remote = addr;
        self
    }

    pub fn ttl(mut self, ttl: u8) -> Self {
        self.data.ttl = ttl;
        self
    }

    pub fn tos(mut self, tos: u8) -> Self {
        self.data.tos = tos;
        self
    }
}

impl LinkConfig for IpipLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Ipip
    }

    fn parent(&self) -> Option<&InterfaceRef> {
        self.parent.as_ref()
    }

    fn build(&self) -> Result<Link> {
        Ok(base_link(&self.name, LinkKind::Ipip, self.mtu, None, self.up)?
            .with_payload(LinkPayload::Ipip(self.data.clone())))
    }
}

// ============================================================================
// IPv6 tunnels
// ============================================================================

/// Configuration for an ip6tnl (IPv4/IPv6 over IPv6) tunnel.
///
/// # Example
///
/// ```ignore
/// use netplat::platform::link::Ip6TnlLink;
///
/// let tnl = Ip6TnlLink::new("ip6tnl1")
///     .local("2001:db8::1".parse()?)
///     .remote("2001:db8::2".parse()?)
///     .encap_limit(0);
///
/// platform.link_add(&tnl)?;
/// ```
#[derive(Debug, Clone)]
pub struct Ip6TnlLink {
    name: String,
    parent: Option<InterfaceRef>,
    mtu: Option<u32>,
    up: bool,
    data: Ip6TnlData,
}

impl Ip6TnlLink {
    /// Create a new ip6tnl configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            mtu: None,
            up: false,
            data: Ip6TnlData::default(),
        }
    }

    pub fn parent(mut self, parent: impl Into<InterfaceRef>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    pub fn up(mut self) -> Self {
        self.up = true;
        self
    }

    pub fn local(mut self, addr: Ipv6Addr) -> Self {
        self.data.local = addr;
        self
    }

    pub fn remote(mut self, addr: Ipv6Addr) -> Self {
        self.data.remote = addr;
        self
    }

    /// Set the hop limit.
    pub fn ttl(mut self, ttl: u8) -> Self {
        self.data.ttl = ttl;
        self
    }

    /// Set the traffic class.
    pub fn tclass(mut self, tclass: u8) -> Self {
        self.data.tclass = tclass;
        self
    }

    /// Set the encapsulation limit.
    pub fn encap_limit(mut self, limit: u8) -> Self {
        self.data.encap_limit = limit;
        self
    }

    /// Set the flow label (20 bits).
    pub fn flow_label(mut self, label: u32) -> Self {
        self.data.flow_label = label;
        self
    }

    /// Set the inner protocol (IPPROTO_IPIP, IPPROTO_IPV6 or 0 for any).
    pub fn proto(mut self, proto: u8) -> Self {
        self.data.proto = proto;
        self
    }

    /// Set tunnel flags (IP6_TNL_F_*).
    pub fn flags(mut self, flags: u32) -> Self {
        self.data.flags = flags;
        self
    }
}

impl LinkConfig for Ip6TnlLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Ip6Tnl
    }

    fn parent(&self) -> Option<&InterfaceRef> {
        self.parent.as_ref()
    }

    fn build(&self) -> Result<Link> {
        check_flow_label(&self.name, self.data.flow_label)?;
        Ok(base_link(&self.name, LinkKind::Ip6Tnl, self.mtu, None, self.up)?
            .with_payload(LinkPayload::Ip6Tnl(self.data.clone())))
    }
}

/// Configuration for an ip6gre or ip6gretap tunnel.
#[derive(Debug, Clone)]
pub struct Ip6GreLink {
    name: String,
    parent: Option<InterfaceRef>,
    mtu: Option<u32>,
    up: bool,
    data: Ip6TnlData,
}

impl Ip6GreLink {
    /// Create a new ip6gre configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            mtu: None,
            up: false,
            data: Ip6TnlData {
                is_gre: true,
                proto: libc::IPPROTO_GRE as u8,
                ..Default::default()
            },
        }
    }

    /// Create an ip6gretap (layer 2) tunnel.
    pub fn tap(mut self) -> Self {
        self.data.is_tap = true;
        self
    }

    pub fn parent(mut self, parent: impl Into<InterfaceRef>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    pub fn up(mut self) -> Self {
        self.up = true;
        self
    }

    pub fn local(mut self, addr: Ipv6Addr) -> Self {
        self.data.local = addr;
        self
    }

    pub fn remote(mut self, addr: Ipv6Addr) -> Self {
        self.data.remote = addr;
        self
    }

    pub fn ikey(mut self, key: u32) -> Self {
        self.data.input_key = key;
        self.data.input_flags |= GRE_KEY;
        self
    }

    pub fn okey(mut self, key: u32) -> Self {
        self.data.output_key = key;
        self.data.output_flags |= GRE_KEY;
        self
    }

    pub fn ttl(mut self, ttl: u8) -> Self {
        self.data.ttl = ttl;
        self
    }

    pub fn tclass(mut self, tclass: u8) -> Self {
        self.data.tclass = tclass;
        self
    }

    pub fn flow_label(mut self, label: u32) -> Self {
        self.data.flow_label = label;
        self
    }

    pub fn encap_limit(mut self, limit: u8) -> Self {
        self.data.encap_limit = limit;
        self
    }
}

impl LinkConfig for Ip6GreLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LinkKind {
        if self.data.is_tap {
            LinkKind::Ip6Gretap
        } else {
            LinkKind::Ip6Gre
        }
    }

    fn parent(&self) -> Option<&InterfaceRef> {
        self.parent.as_ref()
    }

    fn build(&self) -> Result<Link> {
        check_flow_label(&self.name, self.data.flow_label)?;
        Ok(base_link(&self.name, self.kind(), self.mtu, None, self.up)?
            .with_payload(LinkPayload::Ip6Tnl(self.data.clone())))
    }
}

fn check_flow_label(name: &str, label: u32) -> Result<()> {
    if label > 0xF_FFFF {
        return Err(Error::InvalidArgument(format!(
            "{}: flow label 0x{:x} exceeds 20 bits",
            name, label
        )));
    }
    Ok(())
}

// ============================================================================
// VTI Links
// ============================================================================

/// Configuration for a VTI (Virtual Tunnel Interface) for IPv4.
///
/// # Example
///
/// ```ignore
/// use netplat::platform::link::VtiLink;
/// use std::net::Ipv4Addr;
///
/// let vti = VtiLink::new("vti0")
///     .local(Ipv4Addr::new(10, 0, 0, 1))
///     .remote(Ipv4Addr::new(10, 0, 0, 2))
///     .ikey(100)
///     .okey(100);
///
/// platform.link_add(&vti)?;
/// ```
#[derive(Debug, Clone)]
pub struct VtiLink {
    name: String,
    parent: Option<InterfaceRef>,
    up: bool,
    data: VtiData,
}

impl VtiLink {
    /// Create a new VTI interface configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            up: false,
            data: VtiData::default(),
        }
    }

    /// Set the underlying link device.
    pub fn parent(mut self, parent: impl Into<InterfaceRef>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn up(mut self) -> Self {
        self.up = true;
        self
    }

    /// Set the local (source) address.
    pub fn local(mut self, addr: Ipv4Addr) -> Self {
        self.data.local = addr;
        self
    }

    /// Set the remote (destination) address.
    pub fn remote(mut self, addr: Ipv4Addr) -> Self {
        self.data.remote = addr;
        self
    }

    /// Set the input key (for identifying incoming traffic).
    pub fn ikey(mut self, key: u32) -> Self {
        self.data.input_key = key;
        self
    }

    /// Set the output key (for marking outgoing traffic).
    pub fn okey(mut self, key: u32) -> Self {
        self.data.output_key = key;
        self
    }

    /// Set the firewall mark.
    pub fn fwmark(mut self, mark: u32) -> Self {
        self.data.fwmark = mark;
        self
    }
}

impl LinkConfig for VtiLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Vti
    }

    fn parent(&self) -> Option<&InterfaceRef> {
        self.parent.as_ref()
    }

    fn build(&self) -> Result<Link> {
        Ok(base_link(&self.name, LinkKind::Vti, None, None, self.up)?
            .with_payload(LinkPayload::Vti(self.data.clone())))
    }
}

/// Configuration for a VTI6 (Virtual Tunnel Interface) for IPv6.
#[derive(Debug, Clone)]
pub struct Vti6Link {
    name: String,
    parent: Option<InterfaceRef>,
    up: bool,
    data: Vti6Data,
}

impl Vti6Link {
    /// Create a new VTI6 interface configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            up: false,
            data: Vti6Data::default(),
        }
    }

    pub fn parent(mut self, parent: impl Into<InterfaceRef>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn up(mut self) -> Self {
        self.up = true;
        self
    }

    pub fn local(mut self, addr: Ipv6Addr) -> Self {
        self.data.local = addr;
        self
    }

    pub fn remote(mut self, addr: Ipv6Addr) -> Self {
        self.data.remote = addr;
        self
    }

    pub fn ikey(mut self, key: u32) -> Self {
        self.data.input_key = key;
        self
    }

    pub fn okey(mut self, key: u32) -> Self {
        self.data.output_key = key;
        self
    }

    pub fn fwmark(mut self, mark: u32) -> Self {
        self.data.fwmark = mark;
        self
    }
}

impl LinkConfig for Vti6Link {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Vti6
    }

    fn parent(&self) -> Option<&InterfaceRef> {
        self.parent.as_ref()
    }

    fn build(&self) -> Result<Link> {
        Ok(base_link(&self.name, LinkKind::Vti6, None, None, self.up)?
            .with_payload(LinkPayload::Vti6(self.data.clone())))
    }
}

// ============================================================================
// MACsec Link
// ============================================================================

/// Configuration for a MACsec interface.
///
/// # Example
///
/// ```ignore
/// use netplat::platform::link::MacsecLink;
///
/// let macsec = MacsecLink::new("macsec0", "eth0")
///     .sci(0x0200_0000_0001_0001)
///     .encrypt(true)
///     .replay_protect(32);
///
/// platform.link_add(&macsec)?;
/// ```
#[derive(Debug, Clone)]
pub struct MacsecLink {
    name: String,
    parent: InterfaceRef,
    address: Option<[u8; 6]>,
    up: bool,
    data: MacsecData,
}

impl MacsecLink {
    /// Create a new MACsec interface on `parent`.
    pub fn new(name: impl Into<String>, parent: impl Into<InterfaceRef>) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            address: None,
            up: false,
            data: MacsecData::default(),
        }
    }

    pub fn address(mut self, addr: [u8; 6]) -> Self {
        self.address = Some(addr);
        self
    }

    pub fn up(mut self) -> Self {
        self.up = true;
        self
    }

    /// Set the secure channel identifier.
    pub fn sci(mut self, sci: u64) -> Self {
        self.data.sci = sci;
        self
    }

    /// Set the cipher suite.
    pub fn cipher_suite(mut self, cipher: u64) -> Self {
        self.data.cipher_suite = cipher;
        self
    }

    /// Set the ICV length in bytes (8-16).
    pub fn icv_length(mut self, len: u8) -> Self {
        self.data.icv_length = len;
        self
    }

    /// Set the encoding security association (0-3).
    pub fn encoding_sa(mut self, sa: u8) -> Self {
        self.data.encoding_sa = sa;
        self
    }

    pub fn validation(mut self, validation: MacsecValidation) -> Self {
        self.data.validation = validation;
        self
    }

    pub fn encrypt(mut self, enabled: bool) -> Self {
        self.data.encrypt = enabled;
        self
    }

    pub fn protect(mut self, enabled: bool) -> Self {
        self.data.protect = enabled;
        self
    }

    pub fn include_sci(mut self, enabled: bool) -> Self {
        self.data.include_sci = enabled;
        self
    }

    /// Set the end station bit.
    pub fn es(mut self, enabled: bool) -> Self {
        self.data.es = enabled;
        self
    }

    /// Set the single copy broadcast bit.
    pub fn scb(mut self, enabled: bool) -> Self {
        self.data.scb = enabled;
        self
    }

    /// Enable replay protection with the given window.
    pub fn replay_protect(mut self, window: u32) -> Self {
        self.data.replay_protect = true;
        self.data.window = window;
        self
    }
}

impl LinkConfig for MacsecLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Macsec
    }

    fn parent(&self) -> Option<&InterfaceRef> {
        Some(&self.parent)
    }

    fn build(&self) -> Result<Link> {
        if !(8..=16).contains(&self.data.icv_length) {
            return Err(Error::InvalidArgument(format!(
                "{}: icv length {} out of range (8-16)",
                self.name, self.data.icv_length
            )));
        }
        if self.data.encoding_sa > 3 {
            return Err(Error::InvalidArgument(format!(
                "{}: encoding sa {} out of range (0-3)",
                self.name, self.data.encoding_sa
            )));
        }
        if self.data.es && self.data.include_sci {
            return Err(Error::InvalidArgument(format!(
                "{}: end station and include-sci are exclusive",
                self.name
            )));
        }
        Ok(
            base_link(&self.name, LinkKind::Macsec, None, self.address, self.up)?
                .with_payload(LinkPayload::Macsec(self.data.clone())),
        )
    }
}
