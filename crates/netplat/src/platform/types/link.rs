//! Link kinds and interface flags.

use std::fmt;

/// Interface flags (IFF_*).
pub mod iff {
    pub const UP: u32 = libc::IFF_UP as u32;
    pub const BROADCAST: u32 = libc::IFF_BROADCAST as u32;
    pub const LOOPBACK: u32 = libc::IFF_LOOPBACK as u32;
    pub const POINTOPOINT: u32 = libc::IFF_POINTOPOINT as u32;
    pub const RUNNING: u32 = libc::IFF_RUNNING as u32;
    pub const NOARP: u32 = libc::IFF_NOARP as u32;
    pub const PROMISC: u32 = libc::IFF_PROMISC as u32;
    pub const ALLMULTI: u32 = libc::IFF_ALLMULTI as u32;
    pub const MASTER: u32 = libc::IFF_MASTER as u32;
    pub const SLAVE: u32 = libc::IFF_SLAVE as u32;
    pub const MULTICAST: u32 = libc::IFF_MULTICAST as u32;
    pub const LOWER_UP: u32 = 1 << 16;
    pub const DORMANT: u32 = 1 << 17;
}

/// The type of a link as the platform layer understands it.
///
/// The kernel reports a free-form kind string (IFLA_INFO_KIND); this enum is
/// the closed set of kinds the device layer knows how to manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LinkKind {
    #[default]
    Unknown,
    Loopback,
    Ethernet,
    Dummy,
    Veth,
    Bridge,
    Bond,
    Team,
    Vlan,
    Vxlan,
    Gre,
    Gretap,
    Sit,
    Ipip,
    Ip6Tnl,
    Ip6Gre,
    Ip6Gretap,
    Vti,
    Vti6,
    Macsec,
    Macvlan,
    Infiniband,
    Wifi,
    OlpcMesh,
}

impl LinkKind {
    /// Every kind, in declaration order.
    pub const ALL: [LinkKind; 24] = [
        Self::Unknown,
        Self::Loopback,
        Self::Ethernet,
        Self::Dummy,
        Self::Veth,
        Self::Bridge,
        Self::Bond,
        Self::Team,
        Self::Vlan,
        Self::Vxlan,
        Self::Gre,
        Self::Gretap,
        Self::Sit,
        Self::Ipip,
        Self::Ip6Tnl,
        Self::Ip6Gre,
        Self::Ip6Gretap,
        Self::Vti,
        Self::Vti6,
        Self::Macsec,
        Self::Macvlan,
        Self::Infiniband,
        Self::Wifi,
        Self::OlpcMesh,
    ];

    /// Get the kernel kind string (IFLA_INFO_KIND) for this kind.
    ///
    /// Kinds that are not created through rtnetlink (ethernet, wifi, ...)
    /// still get a stable name for display purposes.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Loopback => "loopback",
            Self::Ethernet => "ethernet",
            Self::Dummy => "dummy",
            Self::Veth => "veth",
            Self::Bridge => "bridge",
            Self::Bond => "bond",
            Self::Team => "team",
            Self::Vlan => "vlan",
            Self::Vxlan => "vxlan",
            Self::Gre => "gre",
            Self::Gretap => "gretap",
            Self::Sit => "sit",
            Self::Ipip => "ipip",
            Self::Ip6Tnl => "ip6tnl",
            Self::Ip6Gre => "ip6gre",
            Self::Ip6Gretap => "ip6gretap",
            Self::Vti => "vti",
            Self::Vti6 => "vti6",
            Self::Macsec => "macsec",
            Self::Macvlan => "macvlan",
            Self::Infiniband => "infiniband",
            Self::Wifi => "wifi",
            Self::OlpcMesh => "olpc-mesh",
        }
    }

    /// Parse a kind from its kernel kind string.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Returns true if links of this kind can have ports attached.
    pub fn is_controller(&self) -> bool {
        matches!(self, Self::Bridge | Self::Bond | Self::Team)
    }

    /// Returns true if the carrier of this kind is derived from its ports.
    ///
    /// A team device reports its own carrier; bridges and bonds are only
    /// connected while at least one port is.
    pub fn carrier_from_ports(&self) -> bool {
        matches!(self, Self::Bridge | Self::Bond)
    }

    /// Returns true if attaching a port to this kind forces the port up.
    pub fn port_attach_sets_up(&self) -> bool {
        matches!(self, Self::Bond | Self::Team)
    }

    /// Returns true for software tunnel kinds.
    pub fn is_tunnel(&self) -> bool {
        matches!(
            self,
            Self::Gre
                | Self::Gretap
                | Self::Sit
                | Self::Ipip
                | Self::Ip6Tnl
                | Self::Ip6Gre
                | Self::Ip6Gretap
                | Self::Vti
                | Self::Vti6
        )
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Format interface flags the way `ip link` does (`UP,LOWER_UP,...`).
pub fn format_flags(flags: u32) -> String {
    const NAMES: &[(u32, &str)] = &[
        (iff::UP, "UP"),
        (iff::BROADCAST, "BROADCAST"),
        (iff::LOOPBACK, "LOOPBACK"),
        (iff::POINTOPOINT, "POINTOPOINT"),
        (iff::NOARP, "NOARP"),
        (iff::PROMISC, "PROMISC"),
        (iff::ALLMULTI, "ALLMULTI"),
        (iff::MASTER, "MASTER"),
        (iff::SLAVE, "SLAVE"),
        (iff::MULTICAST, "MULTICAST"),
        (iff::LOWER_UP, "LOWER_UP"),
        (iff::DORMANT, "DORMANT"),
    ];

    NAMES
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_roundtrip() {
        for kind in LinkKind::ALL {
            assert_eq!(LinkKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(LinkKind::from_name("wireguard"), None);
    }

    #[test]
    fn test_controller_kinds() {
        assert!(LinkKind::Bridge.is_controller());
        assert!(LinkKind::Team.is_controller());
        assert!(!LinkKind::Team.carrier_from_ports());
        assert!(LinkKind::Bond.port_attach_sets_up());
        assert!(!LinkKind::Bridge.port_attach_sets_up());
        assert!(!LinkKind::Ethernet.is_controller());
    }

    #[test]
    fn test_format_flags() {
        assert_eq!(format_flags(iff::UP | iff::LOWER_UP), "UP,LOWER_UP");
        assert_eq!(format_flags(0), "");
    }
}
