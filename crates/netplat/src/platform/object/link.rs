//! The link object.

use std::fmt;

use super::payload::{LinkPayload, PortData};
use crate::platform::types::link::{LinkKind, format_flags, iff};
use crate::util::addr::format_mac;

/// Default MTU for new links.
pub const DEFAULT_MTU: u32 = 1500;

/// A network interface as held in the cache.
///
/// `ifindex` is the identity. A link with ifindex 0 is a candidate that
/// has not been realized by a backend yet and cannot be absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Link {
    pub ifindex: i32,
    pub name: String,
    pub kind: LinkKind,
    /// Link-type parameters, if the kind has any.
    pub payload: Option<LinkPayload>,
    /// Ifindex of the lower device (IFLA_LINK), 0 if none.
    pub parent: i32,
    /// Hardware address.
    pub address: Option<Vec<u8>>,
    pub mtu: u32,
    /// Interface flags (IFF_*).
    pub flags: u32,
    /// Ifindex of the controller this link is attached to, 0 if none.
    pub controller: i32,
    /// Port-role data while attached to a bridge or bond.
    pub port: Option<PortData>,
    /// Carrier state as derived by the backend.
    pub connected: bool,
}

impl Link {
    /// Create an unrealized link candidate.
    pub fn new(name: impl Into<String>, kind: LinkKind) -> Self {
        Self {
            ifindex: 0,
            name: name.into(),
            kind,
            payload: None,
            parent: 0,
            address: None,
            mtu: DEFAULT_MTU,
            flags: 0,
            controller: 0,
            port: None,
            connected: false,
        }
    }

    /// Set the interface index.
    pub fn with_ifindex(mut self, ifindex: i32) -> Self {
        self.ifindex = ifindex;
        self
    }

    /// Set the link payload.
    pub fn with_payload(mut self, payload: LinkPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Set the interface flags.
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Check if the administrative up flag is set.
    pub fn is_up(&self) -> bool {
        self.flags & iff::UP != 0
    }

    /// Check if the lower-up (carrier) flag is set.
    pub fn is_lower_up(&self) -> bool {
        self.flags & iff::LOWER_UP != 0
    }

    /// Check if this link is attached to a controller.
    pub fn is_port(&self) -> bool {
        self.controller > 0
    }

    /// Check if this link can act as a controller.
    pub fn is_controller(&self) -> bool {
        self.kind.is_controller()
    }

    /// Get the bridge payload, if any.
    pub fn bridge(&self) -> Option<&super::payload::BridgeData> {
        self.payload.as_ref().and_then(LinkPayload::as_bridge)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: <{}> mtu {} kind {}",
            self.ifindex,
            self.name,
            format_flags(self.flags),
            self.mtu,
            self.kind
        )?;
        if self.parent > 0 {
            write!(f, " link {}", self.parent)?;
        }
        if self.controller > 0 {
            write!(f, " master {}", self.controller)?;
        }
        if let Some(payload) = &self.payload {
            write!(f, " {}", payload.name())?;
        }
        if let Some(addr) = &self.address {
            write!(f, " link/ether {}", format_mac(addr))?;
        }
        f.write_str(if self.connected {
            " connected"
        } else {
            " disconnected"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unrealized() {
        let link = Link::new("br0", LinkKind::Bridge);
        assert_eq!(link.ifindex, 0);
        assert_eq!(link.mtu, DEFAULT_MTU);
        assert!(!link.is_up());
        assert!(link.is_controller());
        assert!(!link.is_port());
    }

    #[test]
    fn test_display() {
        let mut link = Link::new("eth0", LinkKind::Ethernet)
            .with_ifindex(2)
            .with_flags(iff::UP | iff::LOWER_UP);
        link.address = Some(vec![0x02, 0, 0, 0, 0, 0x01]);
        link.connected = true;
        assert_eq!(
            link.to_string(),
            "2: eth0: <UP,LOWER_UP> mtu 1500 kind ethernet link/ether 02:00:00:00:00:01 connected"
        );
    }
}
