//! Link-type specific parameter blocks.
//!
//! A [`LinkPayload`] is owned by the [`Link`](super::Link) it describes and
//! has no cache identity of its own. Changing any attribute of a payload
//! replaces the whole link object in the cache, so subscribers always see a
//! consistent set of tunnel endpoints, keys and TTL.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::platform::types::link::LinkKind;

/// Link-type payload, one variant per virtual device technology.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
pub enum LinkPayload {
    Gre(GreData),
    Sit(SitData),
    Ipip(IpipData),
    Ip6Tnl(Ip6TnlData),
    Vti(VtiData),
    Vti6(Vti6Data),
    Vlan(VlanData),
    Vxlan(VxlanData),
    Macsec(MacsecData),
    Bridge(BridgeData),
    Bond(BondData),
    Infiniband(InfinibandData),
}

impl LinkPayload {
    /// The link kind this payload describes.
    pub fn link_kind(&self) -> LinkKind {
        match self {
            Self::Gre(d) if d.is_tap => LinkKind::Gretap,
            Self::Gre(_) => LinkKind::Gre,
            Self::Sit(_) => LinkKind::Sit,
            Self::Ipip(_) => LinkKind::Ipip,
            Self::Ip6Tnl(d) => match (d.is_gre, d.is_tap) {
                (true, true) => LinkKind::Ip6Gretap,
                (true, false) => LinkKind::Ip6Gre,
                _ => LinkKind::Ip6Tnl,
            },
            Self::Vti(_) => LinkKind::Vti,
            Self::Vti6(_) => LinkKind::Vti6,
            Self::Vlan(_) => LinkKind::Vlan,
            Self::Vxlan(_) => LinkKind::Vxlan,
            Self::Macsec(_) => LinkKind::Macsec,
            Self::Bridge(_) => LinkKind::Bridge,
            Self::Bond(_) => LinkKind::Bond,
            Self::Infiniband(_) => LinkKind::Infiniband,
        }
    }

    /// Short name of the payload variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gre(_) => "gre",
            Self::Sit(_) => "sit",
            Self::Ipip(_) => "ipip",
            Self::Ip6Tnl(_) => "ip6tnl",
            Self::Vti(_) => "vti",
            Self::Vti6(_) => "vti6",
            Self::Vlan(_) => "vlan",
            Self::Vxlan(_) => "vxlan",
            Self::Macsec(_) => "macsec",
            Self::Bridge(_) => "bridge",
            Self::Bond(_) => "bond",
            Self::Infiniband(_) => "infiniband",
        }
    }

    pub fn as_bridge(&self) -> Option<&BridgeData> {
        match self {
            Self::Bridge(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_vlan(&self) -> Option<&VlanData> {
        match self {
            Self::Vlan(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_infiniband(&self) -> Option<&InfinibandData> {
        match self {
            Self::Infiniband(d) => Some(d),
            _ => None,
        }
    }
}

// ============================================================================
// IPv4 tunnels
// ============================================================================

/// GRE / GRETAP parameters (IFLA_GRE_*).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GreData {
    pub local: Ipv4Addr,
    pub remote: Ipv4Addr,
    pub input_flags: u16,
    pub output_flags: u16,
    pub input_key: u32,
    pub output_key: u32,
    pub ttl: u8,
    pub tos: u8,
    pub path_mtu_discovery: bool,
    pub is_tap: bool,
}

impl Default for GreData {
    fn default() -> Self {
        Self {
            local: Ipv4Addr::UNSPECIFIED,
            remote: Ipv4Addr::UNSPECIFIED,
            input_flags: 0,
            output_flags: 0,
            input_key: 0,
            output_key: 0,
            ttl: 0,
            tos: 0,
            path_mtu_discovery: true,
            is_tap: false,
        }
    }
}

/// SIT (IPv6-in-IPv4) parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SitData {
    pub local: Ipv4Addr,
    pub remote: Ipv4Addr,
    pub ttl: u8,
    pub tos: u8,
    pub path_mtu_discovery: bool,
    pub flags: u16,
    pub proto: u8,
}

impl Default for SitData {
    fn default() -> Self {
        Self {
            local: Ipv4Addr::UNSPECIFIED,
            remote: Ipv4Addr::UNSPECIFIED,
            ttl: 0,
            tos: 0,
            path_mtu_discovery: true,
            flags: 0,
            proto: 0,
        }
    }
}

/// IPIP parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IpipData {
    pub local: Ipv4Addr,
    pub remote: Ipv4Addr,
    pub ttl: u8,
    pub tos: u8,
    pub path_mtu_discovery: bool,
}

impl Default for IpipData {
    fn default() -> Self {
        Self {
            local: Ipv4Addr::UNSPECIFIED,
            remote: Ipv4Addr::UNSPECIFIED,
            ttl: 0,
            tos: 0,
            path_mtu_discovery: true,
        }
    }
}

/// VTI (IPv4 IPsec virtual tunnel) parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VtiData {
    pub local: Ipv4Addr,
    pub remote: Ipv4Addr,
    pub input_key: u32,
    pub output_key: u32,
    pub fwmark: u32,
}

impl Default for VtiData {
    fn default() -> Self {
        Self {
            local: Ipv4Addr::UNSPECIFIED,
            remote: Ipv4Addr::UNSPECIFIED,
            input_key: 0,
            output_key: 0,
            fwmark: 0,
        }
    }
}

// ============================================================================
// IPv6 tunnels
// ============================================================================

/// ip6tnl / ip6gre / ip6gretap parameters.
///
/// The kernel uses one attribute family for plain IPv6 tunnels and a
/// second one for IPv6 GRE; both are folded into this record and told
/// apart by `is_gre`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ip6TnlData {
    pub local: Ipv6Addr,
    pub remote: Ipv6Addr,
    pub ttl: u8,
    pub tclass: u8,
    pub encap_limit: u8,
    pub flow_label: u32,
    pub proto: u8,
    pub flags: u32,
    pub is_gre: bool,
    pub is_tap: bool,
    pub input_flags: u16,
    pub output_flags: u16,
    pub input_key: u32,
    pub output_key: u32,
}

impl Default for Ip6TnlData {
    fn default() -> Self {
        Self {
            local: Ipv6Addr::UNSPECIFIED,
            remote: Ipv6Addr::UNSPECIFIED,
            ttl: 0,
            tclass: 0,
            encap_limit: 4,
            flow_label: 0,
            proto: 0,
            flags: 0,
            is_gre: false,
            is_tap: false,
            input_flags: 0,
            output_flags: 0,
            input_key: 0,
            output_key: 0,
        }
    }
}

/// VTI6 (IPv6 IPsec virtual tunnel) parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Vti6Data {
    pub local: Ipv6Addr,
    pub remote: Ipv6Addr,
    pub input_key: u32,
    pub output_key: u32,
    pub fwmark: u32,
}

impl Default for Vti6Data {
    fn default() -> Self {
        Self {
            local: Ipv6Addr::UNSPECIFIED,
            remote: Ipv6Addr::UNSPECIFIED,
            input_key: 0,
            output_key: 0,
            fwmark: 0,
        }
    }
}

// ============================================================================
// VLAN / VXLAN / MACsec
// ============================================================================

/// VLAN flags (VLAN_FLAG_*).
pub mod vlan_flags {
    pub const REORDER_HDR: u32 = 0x1;
    pub const GVRP: u32 = 0x2;
    pub const LOOSE_BINDING: u32 = 0x4;
    pub const MVRP: u32 = 0x8;
}

/// 802.1Q ethertype.
pub const ETH_P_8021Q: u16 = 0x8100;
/// 802.1ad ethertype.
pub const ETH_P_8021AD: u16 = 0x88a8;

/// VLAN parameters (IFLA_VLAN_*).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VlanData {
    pub id: u16,
    pub protocol: u16,
    pub flags: u32,
    /// Ingress priority mapping (from, to).
    pub ingress_qos_map: Vec<(u32, u32)>,
    /// Egress priority mapping (from, to).
    pub egress_qos_map: Vec<(u32, u32)>,
}

impl Default for VlanData {
    fn default() -> Self {
        Self {
            id: 0,
            protocol: ETH_P_8021Q,
            flags: vlan_flags::REORDER_HDR,
            ingress_qos_map: Vec::new(),
            egress_qos_map: Vec::new(),
        }
    }
}

/// VXLAN parameters (IFLA_VXLAN_*).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VxlanData {
    pub id: u32,
    pub group: Option<IpAddr>,
    pub local: Option<IpAddr>,
    pub src_port_min: u16,
    pub src_port_max: u16,
    pub dst_port: u16,
    pub tos: u8,
    pub ttl: u8,
    pub learning: bool,
    pub ageing: u32,
    pub limit: u32,
    pub proxy: bool,
    pub rsc: bool,
    pub l2miss: bool,
    pub l3miss: bool,
}

impl Default for VxlanData {
    fn default() -> Self {
        Self {
            id: 0,
            group: None,
            local: None,
            src_port_min: 0,
            src_port_max: 0,
            dst_port: 4789,
            tos: 0,
            ttl: 0,
            learning: true,
            ageing: 300,
            limit: 0,
            proxy: false,
            rsc: false,
            l2miss: false,
            l3miss: false,
        }
    }
}

/// MACsec validation modes (MACSEC_VALIDATE_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MacsecValidation {
    Disabled,
    Check,
    #[default]
    Strict,
}

/// Default MACsec cipher suite (GCM-AES-128).
pub const MACSEC_DEFAULT_CIPHER_ID: u64 = 0x0080_C200_0100_0001;

/// MACsec SecY parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MacsecData {
    pub sci: u64,
    pub cipher_suite: u64,
    pub window: u32,
    pub icv_length: u8,
    pub encoding_sa: u8,
    pub validation: MacsecValidation,
    pub encrypt: bool,
    pub protect: bool,
    pub include_sci: bool,
    pub es: bool,
    pub scb: bool,
    pub replay_protect: bool,
}

impl Default for MacsecData {
    fn default() -> Self {
        Self {
            sci: 0,
            cipher_suite: MACSEC_DEFAULT_CIPHER_ID,
            window: 0,
            icv_length: 16,
            encoding_sa: 0,
            validation: MacsecValidation::Strict,
            encrypt: true,
            protect: true,
            include_sci: true,
            es: false,
            scb: false,
            replay_protect: false,
        }
    }
}

// ============================================================================
// Bridge / Bond / Infiniband
// ============================================================================

/// Bridge parameters (IFLA_BR_*). Times are in centiseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BridgeData {
    pub forward_delay: u32,
    pub hello_time: u32,
    pub max_age: u32,
    pub ageing_time: u32,
    pub stp_state: bool,
    pub priority: u16,
    pub vlan_protocol: u16,
    pub vlan_filtering: bool,
    pub default_pvid: u16,
    pub multicast_snooping: bool,
}

impl Default for BridgeData {
    fn default() -> Self {
        Self {
            forward_delay: 1500,
            hello_time: 200,
            max_age: 2000,
            ageing_time: 30000,
            stp_state: false,
            priority: 0x8000,
            vlan_protocol: ETH_P_8021Q,
            vlan_filtering: false,
            default_pvid: 1,
            multicast_snooping: true,
        }
    }
}

/// Bonding modes (BOND_MODE_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[repr(u8)]
pub enum BondMode {
    #[default]
    BalanceRr = 0,
    ActiveBackup = 1,
    BalanceXor = 2,
    Broadcast = 3,
    Ieee8023ad = 4,
    BalanceTlb = 5,
    BalanceAlb = 6,
}

impl BondMode {
    /// Get the sysfs name of this mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BalanceRr => "balance-rr",
            Self::ActiveBackup => "active-backup",
            Self::BalanceXor => "balance-xor",
            Self::Broadcast => "broadcast",
            Self::Ieee8023ad => "802.3ad",
            Self::BalanceTlb => "balance-tlb",
            Self::BalanceAlb => "balance-alb",
        }
    }

    /// Parse a mode from its sysfs name.
    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::BalanceRr,
            Self::ActiveBackup,
            Self::BalanceXor,
            Self::Broadcast,
            Self::Ieee8023ad,
            Self::BalanceTlb,
            Self::BalanceAlb,
        ]
        .into_iter()
        .find(|mode| mode.name() == name)
    }
}

/// Bond parameters (IFLA_BOND_*).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BondData {
    pub mode: BondMode,
    pub miimon: u32,
    pub updelay: u32,
    pub downdelay: u32,
    /// Ifindex of the primary port, 0 if unset.
    pub primary: i32,
    pub xmit_hash_policy: u8,
    pub lacp_rate: u8,
    pub min_links: u32,
    pub arp_interval: u32,
}

/// Infiniband child (partition) parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InfinibandData {
    pub p_key: u16,
    /// Transport mode, "datagram" or "connected".
    pub mode: Option<String>,
}

// ============================================================================
// Port data
// ============================================================================

/// Port-role data of a link attached to a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
pub enum PortData {
    Bridge(BridgePortData),
    Bond(BondPortData),
}

impl PortData {
    /// The controller kind this port data belongs to.
    pub fn controller_kind(&self) -> LinkKind {
        match self {
            Self::Bridge(_) => LinkKind::Bridge,
            Self::Bond(_) => LinkKind::Bond,
        }
    }

    /// Default port data for a controller of `kind`, if that kind has any.
    pub fn default_for(kind: LinkKind) -> Option<Self> {
        match kind {
            LinkKind::Bridge => Some(Self::Bridge(BridgePortData::default())),
            LinkKind::Bond => Some(Self::Bond(BondPortData::default())),
            _ => None,
        }
    }
}

/// Bridge port parameters (IFLA_BRPORT_*).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BridgePortData {
    pub path_cost: u32,
    pub priority: u16,
    pub hairpin: bool,
}

impl Default for BridgePortData {
    fn default() -> Self {
        Self {
            path_cost: 100,
            priority: 32,
            hairpin: false,
        }
    }
}

/// Bond port parameters (IFLA_BOND_SLAVE_*).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BondPortData {
    pub queue_id: u16,
    pub prio: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_tunnel_defaults() {
        let gre = GreData::default();
        assert!(gre.local.is_unspecified() && gre.remote.is_unspecified());
        assert!(gre.path_mtu_discovery);
        assert!(!gre.is_tap);

        assert!(SitData::default().remote.is_unspecified());
        assert!(IpipData::default().path_mtu_discovery);
        assert_eq!(VtiData::default().local, Ipv4Addr::UNSPECIFIED);
    }

    #[test]
    fn test_payload_kind() {
        let gre = LinkPayload::Gre(GreData::default());
        assert_eq!(gre.link_kind(), LinkKind::Gre);

        let gretap = LinkPayload::Gre(GreData {
            is_tap: true,
            ..Default::default()
        });
        assert_eq!(gretap.link_kind(), LinkKind::Gretap);

        let ip6gre = LinkPayload::Ip6Tnl(Ip6TnlData {
            is_gre: true,
            ..Default::default()
        });
        assert_eq!(ip6gre.link_kind(), LinkKind::Ip6Gre);
        assert_eq!(
            LinkPayload::Ip6Tnl(Ip6TnlData::default()).link_kind(),
            LinkKind::Ip6Tnl
        );
    }

    #[test]
    fn test_payload_equality_is_whole_record() {
        let a = LinkPayload::Gre(GreData {
            remote: Ipv4Addr::new(203, 0, 113, 1),
            ttl: 64,
            ..Default::default()
        });
        let mut b = a.clone();
        assert_eq!(a, b);
        if let LinkPayload::Gre(d) = &mut b {
            d.input_key = 42;
        }
        assert_ne!(a, b);
    }

    #[test]
    fn test_port_data_default_for() {
        assert!(matches!(
            PortData::default_for(LinkKind::Bridge),
            Some(PortData::Bridge(_))
        ));
        assert!(PortData::default_for(LinkKind::Team).is_none());
        assert_eq!(BondMode::Ieee8023ad.name(), "802.3ad");
    }
}
