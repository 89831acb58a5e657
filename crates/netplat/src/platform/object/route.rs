//! IPv4 and IPv6 route objects.
//!
//! # Example
//!
//! ```ignore
//! use netplat::platform::object::{Ip4Route, RouteMetrics};
//! use std::net::Ipv4Addr;
//!
//! // Default route through a gateway
//! let route = Ip4Route::new(Ipv4Addr::UNSPECIFIED, 0)
//!     .ifindex(2)
//!     .gateway(Ipv4Addr::new(10, 0, 0, 1))
//!     .metric(100);
//!
//! // Route with metrics
//! let route = Ip4Route::new(Ipv4Addr::new(10, 1, 0, 0), 16)
//!     .ifindex(2)
//!     .metrics(RouteMetrics::new().mtu(1400));
//!
//! platform.ip_route_add(NlmFlags::REPLACE, route.into())?;
//! ```

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::platform::types::route::{
    RoutePref, RouteProtocol, RouteScope, RouteType, rt_table,
};

/// Route metrics (RTAX_*). A value of 0 means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RouteMetrics {
    /// Path MTU
    pub mtu: u32,
    /// Advertised MSS
    pub mss: u32,
    /// Window size
    pub window: u32,
    /// Congestion window
    pub cwnd: u32,
    /// Initial congestion window
    pub initcwnd: u32,
    /// Initial receive window
    pub initrwnd: u32,
}

impl RouteMetrics {
    /// Create empty metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set path MTU.
    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = mtu;
        self
    }

    /// Set advertised MSS.
    pub fn mss(mut self, mss: u32) -> Self {
        self.mss = mss;
        self
    }

    /// Set window size.
    pub fn window(mut self, window: u32) -> Self {
        self.window = window;
        self
    }

    /// Set congestion window.
    pub fn cwnd(mut self, cwnd: u32) -> Self {
        self.cwnd = cwnd;
        self
    }

    /// Set initial congestion window.
    pub fn initcwnd(mut self, initcwnd: u32) -> Self {
        self.initcwnd = initcwnd;
        self
    }

    /// Set initial receive window.
    pub fn initrwnd(mut self, initrwnd: u32) -> Self {
        self.initrwnd = initrwnd;
        self
    }

    /// Check if any metrics are set.
    pub fn has_any(&self) -> bool {
        *self != Self::default()
    }
}

impl fmt::Display for RouteMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let named = [
            ("mtu", self.mtu),
            ("advmss", self.mss),
            ("window", self.window),
            ("cwnd", self.cwnd),
            ("initcwnd", self.initcwnd),
            ("initrwnd", self.initrwnd),
        ];
        let mut first = true;
        for (name, value) in named.iter().filter(|(_, v)| *v != 0) {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{} {}", name, value)?;
            first = false;
        }
        Ok(())
    }
}

// ============================================================================
// IPv4 Route
// ============================================================================

/// An IPv4 route.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ip4Route {
    /// Output interface, 0 for routes without a nexthop device.
    pub ifindex: i32,
    pub network: Ipv4Addr,
    pub plen: u8,
    pub gateway: Option<Ipv4Addr>,
    /// Route priority.
    pub metric: u32,
    pub table: u32,
    pub tos: u8,
    pub pref_src: Option<Ipv4Addr>,
    pub scope: RouteScope,
    pub protocol: RouteProtocol,
    pub route_type: RouteType,
    pub metrics: RouteMetrics,
    /// Treat the gateway as directly reachable on `ifindex`.
    pub onlink: bool,
}

impl Ip4Route {
    /// Create a new unicast route in the main table.
    pub fn new(network: Ipv4Addr, plen: u8) -> Self {
        Self {
            ifindex: 0,
            network,
            plen,
            gateway: None,
            metric: 0,
            table: rt_table::MAIN,
            tos: 0,
            pref_src: None,
            scope: RouteScope::Universe,
            protocol: RouteProtocol::Boot,
            route_type: RouteType::Unicast,
            metrics: RouteMetrics::default(),
            onlink: false,
        }
    }

    /// Set the output interface.
    pub fn ifindex(mut self, ifindex: i32) -> Self {
        self.ifindex = ifindex;
        self
    }

    /// Set the gateway address.
    pub fn gateway(mut self, gateway: Ipv4Addr) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set the route metric (priority).
    pub fn metric(mut self, metric: u32) -> Self {
        self.metric = metric;
        self
    }

    /// Set the routing table.
    pub fn table(mut self, table: u32) -> Self {
        self.table = table;
        self
    }

    /// Set the type of service.
    pub fn tos(mut self, tos: u8) -> Self {
        self.tos = tos;
        self
    }

    /// Set the preferred source address.
    pub fn pref_src(mut self, src: Ipv4Addr) -> Self {
        self.pref_src = Some(src);
        self
    }

    /// Set the route scope.
    pub fn scope(mut self, scope: RouteScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the route protocol.
    pub fn protocol(mut self, protocol: RouteProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the route type.
    pub fn route_type(mut self, route_type: RouteType) -> Self {
        self.route_type = route_type;
        self
    }

    /// Set route metrics.
    pub fn metrics(mut self, metrics: RouteMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Mark the gateway as on-link.
    pub fn onlink(mut self) -> Self {
        self.onlink = true;
        self
    }

    /// Check if this is a default route.
    pub fn is_default(&self) -> bool {
        self.plen == 0
    }
}

impl fmt::Display for Ip4Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.route_type != RouteType::Unicast {
            write!(f, "{} ", self.route_type.name())?;
        }
        if self.is_default() {
            f.write_str("default")?;
        } else {
            write!(f, "{}/{}", self.network, self.plen)?;
        }
        if self.tos != 0 {
            write!(f, " tos 0x{:02x}", self.tos)?;
        }
        if let Some(gw) = self.gateway {
            write!(f, " via {}", gw)?;
        }
        if self.ifindex > 0 {
            write!(f, " dev {}", self.ifindex)?;
        }
        if self.table != rt_table::MAIN {
            write!(f, " table {}", self.table)?;
        }
        write!(f, " proto {}", self.protocol.name())?;
        if self.scope != RouteScope::Universe {
            write!(f, " scope {}", self.scope.name())?;
        }
        if let Some(src) = self.pref_src {
            write!(f, " src {}", src)?;
        }
        if self.metric != 0 {
            write!(f, " metric {}", self.metric)?;
        }
        if self.metrics.has_any() {
            write!(f, " {}", self.metrics)?;
        }
        if self.onlink {
            f.write_str(" onlink")?;
        }
        Ok(())
    }
}

// ============================================================================
// IPv6 Route
// ============================================================================

/// An IPv6 route.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ip6Route {
    pub ifindex: i32,
    pub network: Ipv6Addr,
    pub plen: u8,
    pub gateway: Option<Ipv6Addr>,
    pub metric: u32,
    pub table: u32,
    /// Source prefix for source-specific routing.
    pub src: Ipv6Addr,
    pub src_plen: u8,
    pub pref_src: Option<Ipv6Addr>,
    pub protocol: RouteProtocol,
    pub route_type: RouteType,
    /// Router preference (RFC 4191).
    pub pref: RoutePref,
    pub metrics: RouteMetrics,
}

impl Ip6Route {
    /// Create a new unicast route in the main table.
    pub fn new(network: Ipv6Addr, plen: u8) -> Self {
        Self {
            ifindex: 0,
            network,
            plen,
            gateway: None,
            metric: 0,
            table: rt_table::MAIN,
            src: Ipv6Addr::UNSPECIFIED,
            src_plen: 0,
            pref_src: None,
            protocol: RouteProtocol::Boot,
            route_type: RouteType::Unicast,
            pref: RoutePref::Medium,
            metrics: RouteMetrics::default(),
        }
    }

    /// Set the output interface.
    pub fn ifindex(mut self, ifindex: i32) -> Self {
        self.ifindex = ifindex;
        self
    }

    /// Set the gateway address.
    pub fn gateway(mut self, gateway: Ipv6Addr) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set the route metric (priority).
    pub fn metric(mut self, metric: u32) -> Self {
        self.metric = metric;
        self
    }

    /// Set the routing table.
    pub fn table(mut self, table: u32) -> Self {
        self.table = table;
        self
    }

    /// Set the source prefix.
    pub fn src(mut self, src: Ipv6Addr, src_plen: u8) -> Self {
        self.src = src;
        self.src_plen = src_plen;
        self
    }

    /// Set the preferred source address.
    pub fn pref_src(mut self, src: Ipv6Addr) -> Self {
        self.pref_src = Some(src);
        self
    }

    /// Set the route protocol.
    pub fn protocol(mut self, protocol: RouteProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the route type.
    pub fn route_type(mut self, route_type: RouteType) -> Self {
        self.route_type = route_type;
        self
    }

    /// Set the router preference.
    pub fn pref(mut self, pref: RoutePref) -> Self {
        self.pref = pref;
        self
    }

    /// Set route metrics.
    pub fn metrics(mut self, metrics: RouteMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn is_default(&self) -> bool {
        self.plen == 0
    }
}

impl fmt::Display for Ip6Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.route_type != RouteType::Unicast {
            write!(f, "{} ", self.route_type.name())?;
        }
        if self.is_default() {
            f.write_str("default")?;
        } else {
            write!(f, "{}/{}", self.network, self.plen)?;
        }
        if self.src_plen > 0 {
            write!(f, " from {}/{}", self.src, self.src_plen)?;
        }
        if let Some(gw) = self.gateway {
            write!(f, " via {}", gw)?;
        }
        if self.ifindex > 0 {
            write!(f, " dev {}", self.ifindex)?;
        }
        if self.table != rt_table::MAIN {
            write!(f, " table {}", self.table)?;
        }
        write!(f, " proto {}", self.protocol.name())?;
        if let Some(src) = self.pref_src {
            write!(f, " src {}", src)?;
        }
        if self.metric != 0 {
            write!(f, " metric {}", self.metric)?;
        }
        if self.metrics.has_any() {
            write!(f, " {}", self.metrics)?;
        }
        match self.pref {
            RoutePref::Medium => Ok(()),
            RoutePref::Low => f.write_str(" pref low"),
            RoutePref::High => f.write_str(" pref high"),
        }
    }
}
