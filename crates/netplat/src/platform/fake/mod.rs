//! In-memory reference backend.
//!
//! [`FakePlatform`] simulates the kernel behaviour device logic depends on,
//! so that logic can be tested without a kernel:
//!
//! - carrier ("connected") is derived from the up flag, and for bridges and
//!   bonds from their attached ports
//! - every connected link gets an IPv6 link-local address derived from its
//!   creation ordinal
//! - routes through a gateway need a route covering that gateway
//! - deleting a link removes its addresses and routes, and releases ports
//! - attaching a port to a bond or team brings the port up
//! - bridge settings are mirrored into simulated sysfs keys
//!
//! # Example
//!
//! ```ignore
//! use netplat::platform::{FakePlatform, Platform};
//! use netplat::platform::link::GenericLink;
//!
//! let mut platform = FakePlatform::new();
//! let mut changes = platform.subscribe();
//!
//! let eth0 = platform.link_add(&GenericLink::ethernet("eth0").up())?;
//! for change in changes.drain() {
//!     println!("{}", change);
//! }
//! ```

pub mod sysctl;

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::{debug, warn};

pub use sysctl::{SysctlPath, SysctlStore};

use super::backend::{LinkSettings, Platform, WifiMode};
use super::cache::ObjectCache;
use super::error::{Error, Result};
use super::events::{ChangeStream, Notifier};
use super::id::ObjectId;
use super::link::LinkConfig;
use super::object::payload::InfinibandData;
use super::object::{
    Ip4Address, Ip6Address, Link, LinkPayload, ObjectKind, ObjectRef, PlatformObject, PortData,
};
use super::sync::{DumpSync, SyncReport};
use super::types::addr::ifa_flags;
use super::types::link::{LinkKind, iff};
use super::types::route::NlmFlags;
use crate::util::addr::{ipv4_in_prefix, ipv6_in_prefix};
use crate::util::ifname;

/// Ifindex of the loopback link every instance starts with.
pub const LOOPBACK_IFINDEX: i32 = 1;

/// Longest hardware address a link accepts (MAX_ADDR_LEN).
pub const MAX_ADDR_LEN: usize = 32;

/// Longest mesh SSID.
pub const MESH_SSID_MAX: usize = 32;

/// Link-local address synthesized for the link with creation ordinal
/// `ordinal`: `fe80::fa:ce:b0:<ordinal>`.
pub fn link_local_address(ordinal: u16) -> Ipv6Addr {
    Ipv6Addr::new(0xfe80, 0, 0, 0, 0xfa, 0xce, 0xb0, ordinal)
}

/// Per-link state that is not part of the link object.
#[derive(Debug, Clone, Default)]
struct LinkState {
    ordinal: u16,
    settings: LinkSettings,
    wifi_mode: WifiMode,
    mesh_channel: u32,
    mesh_ssid: Vec<u8>,
}

/// In-memory platform backend.
#[derive(Debug)]
pub struct FakePlatform {
    cache: ObjectCache,
    notifier: Notifier,
    sysctl: SysctlStore,
    state: HashMap<i32, LinkState>,
    next_ifindex: i32,
    next_ordinal: u16,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePlatform {
    /// Create a backend holding only the loopback link.
    pub fn new() -> Self {
        let mut platform = Self {
            cache: ObjectCache::new(),
            notifier: Notifier::new(),
            sysctl: SysctlStore::new(),
            state: HashMap::new(),
            next_ifindex: LOOPBACK_IFINDEX,
            next_ordinal: 0,
        };

        let mut lo = Link::new("lo", LinkKind::Loopback).with_flags(iff::UP | iff::LOOPBACK);
        lo.mtu = 65536;
        if let Err(err) = platform.insert_link(lo) {
            warn!(%err, "fake: cannot create loopback");
        }
        platform
    }

    /// The simulated sysctl store.
    pub fn sysctl(&self) -> &SysctlStore {
        &self.sysctl
    }

    /// The link-local address this backend assigns to `ifindex` while the
    /// link is connected.
    pub fn link_local_of(&self, ifindex: i32) -> Option<Ipv6Addr> {
        self.state
            .get(&ifindex)
            .map(|state| link_local_address(state.ordinal))
    }

    /// Replace the cache content of one kind with a dump, as a kernel
    /// backend does after a resync.
    pub fn sync_dump<I>(&mut self, kind: ObjectKind, objects: I) -> Result<SyncReport>
    where
        I: IntoIterator<Item = PlatformObject>,
    {
        let report = DumpSync::new(kind).run(&mut self.cache, &mut self.notifier, objects)?;
        if kind == ObjectKind::Link {
            for obj in &report.removed {
                self.state.remove(&obj.ifindex());
            }
            if let Some(max) = self.cache.lookup(ObjectKind::Link, None).map(|o| o.ifindex()).max()
            {
                self.next_ifindex = self.next_ifindex.max(max + 1);
            }
        }
        Ok(report)
    }

    // ========================================================================
    // Link bookkeeping
    // ========================================================================

    fn require_link(&self, ifindex: i32) -> Result<&Link> {
        self.cache
            .link_by_ifindex(ifindex)
            .ok_or(Error::LinkNotFound { ifindex })
    }

    fn require_kind(&self, ifindex: i32, kind: LinkKind, operation: &str) -> Result<&Link> {
        let link = self.require_link(ifindex)?;
        if link.kind != kind {
            return Err(Error::NotSupported(format!(
                "{}: {} on a {} link",
                link.name, operation, link.kind
            )));
        }
        Ok(link)
    }

    fn state_mut(&mut self, ifindex: i32) -> &mut LinkState {
        let next = &mut self.next_ordinal;
        self.state.entry(ifindex).or_insert_with(|| {
            let ordinal = *next;
            *next = next.wrapping_add(1);
            LinkState {
                ordinal,
                ..Default::default()
            }
        })
    }

    /// Realize a link candidate: assign ifindex and ordinal, then commit.
    fn insert_link(&mut self, mut link: Link) -> Result<ObjectRef> {
        if self.cache.link_by_name(&link.name).is_some() {
            return Err(Error::AlreadyExists {
                what: format!("link {}", link.name),
            });
        }

        link.ifindex = self.next_ifindex;
        self.next_ifindex += 1;
        let ordinal = self.state_mut(link.ifindex).ordinal;
        if link.kind == LinkKind::Bridge {
            self.write_bridge_sysctls(&link);
        }

        debug!(
            ifindex = link.ifindex,
            name = %link.name,
            kind = %link.kind,
            ordinal,
            "fake: link added"
        );
        self.commit_link(link)
    }

    /// Derive carrier, absorb the link and apply the carrier side effects.
    fn commit_link(&mut self, mut link: Link) -> Result<ObjectRef> {
        link.connected = self.derive_connected(&link);
        if link.connected {
            link.flags |= iff::LOWER_UP;
        } else {
            link.flags &= !iff::LOWER_UP;
        }

        let was_connected = self
            .cache
            .link_by_ifindex(link.ifindex)
            .map(|prev| prev.connected);
        let (ifindex, connected, controller) = (link.ifindex, link.connected, link.controller);

        let obj = PlatformObject::from(link).into_ref();
        let update = self.cache.absorb(obj.clone(), false, NlmFlags::NONE)?;
        self.notifier.publish(&update);

        if was_connected != Some(connected) {
            debug!(ifindex, connected, "fake: carrier changed");
            self.sync_link_local(ifindex, connected)?;
            if controller > 0 {
                self.refresh_link(controller)?;
            }
        }

        Ok(update.new.unwrap_or(obj))
    }

    /// Re-evaluate a link whose derived state may be stale.
    fn refresh_link(&mut self, ifindex: i32) -> Result<()> {
        match self.cache.link_by_ifindex(ifindex).cloned() {
            Some(link) => self.commit_link(link).map(|_| ()),
            None => Ok(()),
        }
    }

    fn derive_connected(&self, link: &Link) -> bool {
        if !link.is_up() {
            return false;
        }
        if link.kind.carrier_from_ports() {
            return self.cache.ports_of(link.ifindex).any(|port| port.connected);
        }
        true
    }

    fn sync_link_local(&mut self, ifindex: i32, connected: bool) -> Result<()> {
        if self
            .cache
            .link_by_ifindex(ifindex)
            .is_none_or(|link| link.kind == LinkKind::Loopback)
        {
            return Ok(());
        }

        let address = link_local_address(self.state_mut(ifindex).ordinal);
        let candidate = PlatformObject::from(
            Ip6Address::new(ifindex, address, 64).flags(ifa_flags::PERMANENT),
        )
        .into_ref();

        let update = if connected {
            self.cache.absorb(candidate, false, NlmFlags::NONE)?
        } else {
            self.cache.remove(candidate, false)
        };
        self.notifier.publish(&update);
        Ok(())
    }

    fn write_bridge_sysctls(&mut self, link: &Link) {
        let data = link.bridge().cloned().unwrap_or_default();
        self.sysctl.insert(
            SysctlPath::bridge(&link.name, "vlan_filtering"),
            if data.vlan_filtering { "1" } else { "0" },
        );
        self.sysctl.insert(
            SysctlPath::bridge(&link.name, "default_pvid"),
            &data.default_pvid.to_string(),
        );
    }

    fn remove_object(&mut self, obj: PlatformObject) -> Result<()> {
        let update = self.cache.remove(obj.identity(), false);
        if !update.is_change() {
            return Err(Error::NotFound {
                what: format!("{} {}", obj.kind(), obj),
            });
        }
        self.notifier.publish(&update);
        Ok(())
    }

    fn gateway_reachable(&self, kind: ObjectKind, ifindex: i32, gateway: IpAddr) -> bool {
        // Every link has an implicit fe80::/64 route.
        if let IpAddr::V6(gw) = gateway
            && gw.is_unicast_link_local()
        {
            return true;
        }
        self.cache
            .lookup(kind, Some(ifindex))
            .any(|obj| match (&**obj, gateway) {
                // Only direct routes cover a gateway.
                (PlatformObject::Ip4Route(route), IpAddr::V4(gw)) => {
                    route.gateway.is_none_or(|via| via.is_unspecified())
                        && ipv4_in_prefix(gw, route.network, route.plen)
                }
                (PlatformObject::Ip6Route(route), IpAddr::V6(gw)) => {
                    route.gateway.is_none_or(|via| via.is_unspecified())
                        && ipv6_in_prefix(gw, route.network, route.plen)
                }
                _ => false,
            })
    }
}

/// Kinds the kernel tears down together with their lower device.
fn is_stacked(kind: LinkKind) -> bool {
    matches!(
        kind,
        LinkKind::Vlan | LinkKind::Macsec | LinkKind::Macvlan | LinkKind::Infiniband
    )
}

fn clear_port(link: &mut Link) {
    link.controller = 0;
    link.port = None;
    link.flags &= !iff::SLAVE;
}

impl Platform for FakePlatform {
    fn cache(&self) -> &ObjectCache {
        &self.cache
    }

    fn subscribe(&mut self) -> ChangeStream {
        self.notifier.subscribe()
    }

    fn subscribe_bounded(&mut self, capacity: usize) -> ChangeStream {
        self.notifier.subscribe_bounded(capacity)
    }

    // ========================================================================
    // Links
    // ========================================================================

    fn link_add(&mut self, config: &dyn LinkConfig) -> Result<ObjectRef> {
        let mut link = config.build()?;
        if let Some(parent) = config.parent() {
            link.parent = parent.resolve(&self.cache)?;
        }
        self.insert_link(link)
    }

    fn link_delete(&mut self, ifindex: i32) -> Result<()> {
        let link = self.require_link(ifindex)?.clone();

        let children: Vec<i32> = self
            .cache
            .lookup(ObjectKind::Link, None)
            .filter_map(|obj| obj.as_link())
            .filter(|child| child.parent == ifindex && is_stacked(child.kind))
            .map(|child| child.ifindex)
            .collect();
        for child in children {
            self.link_delete(child)?;
        }

        debug!(ifindex, name = %link.name, "fake: link deleted");
        let update = self.cache.remove(ObjectId::Link(ifindex), false);
        self.notifier.publish(&update);

        for kind in [
            ObjectKind::Ip4Address,
            ObjectKind::Ip6Address,
            ObjectKind::Ip4Route,
            ObjectKind::Ip6Route,
        ] {
            let ids: Vec<ObjectId> = self
                .cache
                .lookup(kind, Some(ifindex))
                .map(|obj| obj.identity())
                .collect();
            for id in ids {
                let update = self.cache.remove(id, false);
                self.notifier.publish(&update);
            }
        }

        self.state.remove(&ifindex);
        if link.kind == LinkKind::Bridge {
            self.sysctl.remove_bridge(&link.name);
        }

        if link.kind.is_controller() {
            let ports: Vec<Link> = self.cache.ports_of(ifindex).cloned().collect();
            for mut port in ports {
                clear_port(&mut port);
                self.commit_link(port)?;
            }
        }
        if link.controller > 0 {
            self.refresh_link(link.controller)?;
        }
        Ok(())
    }

    fn link_change_flags(&mut self, ifindex: i32, mask: u32, set: u32) -> Result<()> {
        let mut link = self.require_link(ifindex)?.clone();
        // Carrier is derived, never set by the caller.
        let mask = mask & !iff::LOWER_UP;
        link.flags = (link.flags & !mask) | (set & mask);
        self.commit_link(link).map(|_| ())
    }

    fn link_set_address(&mut self, ifindex: i32, address: &[u8]) -> Result<()> {
        if address.is_empty() || address.len() > MAX_ADDR_LEN {
            return Err(Error::InvalidArgument(format!(
                "hardware address length {} out of range (1-{})",
                address.len(),
                MAX_ADDR_LEN
            )));
        }
        let mut link = self.require_link(ifindex)?.clone();
        link.address = Some(address.to_vec());
        self.commit_link(link).map(|_| ())
    }

    fn link_set_mtu(&mut self, ifindex: i32, mtu: u32) -> Result<()> {
        if mtu == 0 {
            return Err(Error::InvalidArgument("mtu must be > 0".to_string()));
        }
        let mut link = self.require_link(ifindex)?.clone();
        link.mtu = mtu;
        self.commit_link(link).map(|_| ())
    }

    fn link_attach_port(&mut self, controller: i32, port: i32) -> Result<()> {
        if controller == port {
            return Err(Error::InvalidArgument(format!(
                "ifindex {} cannot be its own port",
                port
            )));
        }
        let ctrl = self.require_link(controller)?.clone();
        if !ctrl.kind.is_controller() {
            return Err(Error::NotSupported(format!(
                "{}: a {} link cannot have ports",
                ctrl.name, ctrl.kind
            )));
        }
        let mut link = self.require_link(port)?.clone();
        if link.controller == controller {
            return Ok(());
        }
        if link.controller != 0 {
            return Err(Error::AlreadyExists {
                what: format!("{} is already a port of ifindex {}", link.name, link.controller),
            });
        }

        // Refuse loops: the port must not be above the controller.
        let mut upper = ctrl.controller;
        for _ in 0..self.cache.count(ObjectKind::Link) {
            if upper == 0 {
                break;
            }
            if upper == port {
                return Err(Error::InvalidArgument(format!(
                    "{} is a controller of {}",
                    link.name, ctrl.name
                )));
            }
            upper = self.cache.link_by_ifindex(upper).map_or(0, |l| l.controller);
        }

        debug!(controller = %ctrl.name, port = %link.name, "fake: port attached");
        link.controller = controller;
        link.port = PortData::default_for(ctrl.kind);
        if ctrl.kind == LinkKind::Bond {
            link.flags |= iff::SLAVE;
        }
        if ctrl.kind.port_attach_sets_up() {
            link.flags |= iff::UP;
        }
        self.commit_link(link)?;
        self.refresh_link(controller)
    }

    fn link_release_port(&mut self, controller: i32, port: i32) -> Result<()> {
        let mut link = self.require_link(port)?.clone();
        if link.controller != controller {
            return Err(Error::NotFound {
                what: format!("{} as port of ifindex {}", link.name, controller),
            });
        }
        debug!(controller, port = %link.name, "fake: port released");
        clear_port(&mut link);
        self.commit_link(link)?;
        self.refresh_link(controller)
    }

    fn link_change_port_data(&mut self, ifindex: i32, data: PortData) -> Result<()> {
        let mut link = self.require_link(ifindex)?.clone();
        if !link.is_port() {
            return Err(Error::InvalidArgument(format!("{} is not a port", link.name)));
        }
        let controller_kind = self.require_link(link.controller)?.kind;
        if data.controller_kind() != controller_kind {
            return Err(Error::InvalidArgument(format!(
                "{}: {} port data under a {} controller",
                link.name,
                data.controller_kind(),
                controller_kind
            )));
        }
        link.port = Some(data);
        self.commit_link(link).map(|_| ())
    }

    fn link_change_payload(&mut self, ifindex: i32, payload: LinkPayload) -> Result<()> {
        let mut link = self.require_link(ifindex)?.clone();
        if payload.link_kind() != link.kind {
            return Err(Error::InvalidArgument(format!(
                "{}: {} payload on a {} link",
                link.name,
                payload.name(),
                link.kind
            )));
        }
        link.payload = Some(payload);
        if link.kind == LinkKind::Bridge {
            self.write_bridge_sysctls(&link);
        }
        self.commit_link(link).map(|_| ())
    }

    // ========================================================================
    // Addresses
    // ========================================================================

    fn ip4_address_add(&mut self, address: Ip4Address) -> Result<()> {
        self.require_link(address.ifindex)?;
        let update = self
            .cache
            .absorb(PlatformObject::from(address).into_ref(), false, NlmFlags::NONE)?;
        self.notifier.publish(&update);
        Ok(())
    }

    fn ip4_address_delete(
        &mut self,
        ifindex: i32,
        address: Ipv4Addr,
        plen: u8,
        peer: Option<Ipv4Addr>,
    ) -> Result<()> {
        let mut template = Ip4Address::new(ifindex, address, plen);
        if let Some(peer) = peer {
            template = template.peer(peer);
        }
        self.remove_object(template.into())
    }

    fn ip6_address_add(&mut self, address: Ip6Address) -> Result<()> {
        self.require_link(address.ifindex)?;
        let update = self
            .cache
            .absorb(PlatformObject::from(address).into_ref(), false, NlmFlags::NONE)?;
        self.notifier.publish(&update);
        Ok(())
    }

    fn ip6_address_delete(&mut self, ifindex: i32, address: Ipv6Addr, plen: u8) -> Result<()> {
        self.remove_object(Ip6Address::new(ifindex, address, plen).into())
    }

    // ========================================================================
    // Routes
    // ========================================================================

    fn ip_route_add(&mut self, flags: NlmFlags, route: PlatformObject) -> Result<()> {
        let allowed = (NlmFlags::REPLACE | NlmFlags::CREATE).bits();
        if !flags.is_replace() || flags.bits() & !allowed != 0 {
            warn!(%flags, "fake: route add without replace semantics");
            return Err(Error::NotSupported(format!("route add with flags {}", flags)));
        }

        let (ifindex, needs_ifindex, gateway) = match &route {
            PlatformObject::Ip4Route(r) => (
                r.ifindex,
                r.route_type.needs_ifindex(),
                r.gateway
                    .filter(|gw| !gw.is_unspecified() && !r.onlink)
                    .map(IpAddr::V4),
            ),
            PlatformObject::Ip6Route(r) => (
                r.ifindex,
                r.route_type.needs_ifindex(),
                r.gateway
                    .filter(|gw| !gw.is_unspecified())
                    .map(IpAddr::V6),
            ),
            other => {
                return Err(Error::InvalidArgument(format!(
                    "{} is not a route",
                    other.kind()
                )));
            }
        };

        route.validate()?;
        if needs_ifindex || ifindex > 0 {
            self.require_link(ifindex)?;
        }
        if let Some(gateway) = gateway
            && !self.gateway_reachable(route.kind(), ifindex, gateway)
        {
            warn!(%gateway, ifindex, "fake: route gateway unreachable");
            return Err(Error::NetworkUnreachable { gateway });
        }

        let update = self.cache.absorb(route.into_ref(), false, flags)?;
        self.notifier.publish(&update);
        if let Some(replaced) = &update.replaced {
            debug!(replaced = %replaced, "fake: route replaced");
            let removal = self.cache.remove(replaced, false);
            self.notifier.publish(&removal);
        }
        Ok(())
    }

    fn ip_route_delete(&mut self, template: &PlatformObject) -> Result<()> {
        if !template.kind().is_route() {
            return Err(Error::InvalidArgument(format!(
                "{} is not a route",
                template.kind()
            )));
        }
        self.remove_object(template.clone())
    }

    // ========================================================================
    // Host integration
    // ========================================================================

    fn sysctl_get(&self, path: &str) -> Result<String> {
        self.sysctl.get(path)
    }

    fn sysctl_set(&mut self, path: &str, value: &str) -> Result<()> {
        self.sysctl.set(path, value).map(|_| ())
    }

    fn link_get_settings(&self, ifindex: i32) -> Result<LinkSettings> {
        self.require_link(ifindex)?;
        Ok(self
            .state
            .get(&ifindex)
            .map(|state| state.settings.clone())
            .unwrap_or_default())
    }

    fn link_set_settings(&mut self, ifindex: i32, settings: &LinkSettings) -> Result<()> {
        self.require_link(ifindex)?;
        if settings.speed == Some(0) {
            return Err(Error::InvalidArgument("speed must be > 0".to_string()));
        }
        debug!(ifindex, %settings, "fake: link settings");
        self.state_mut(ifindex).settings = settings.clone();
        Ok(())
    }

    fn wifi_get_mode(&self, ifindex: i32) -> Result<WifiMode> {
        self.require_kind(ifindex, LinkKind::Wifi, "wifi mode")?;
        Ok(self
            .state
            .get(&ifindex)
            .map(|state| state.wifi_mode)
            .unwrap_or_default())
    }

    fn wifi_set_mode(&mut self, ifindex: i32, mode: WifiMode) -> Result<()> {
        self.require_kind(ifindex, LinkKind::Wifi, "wifi mode")?;
        self.state_mut(ifindex).wifi_mode = mode;
        Ok(())
    }

    fn mesh_get_channel(&self, ifindex: i32) -> Result<u32> {
        self.require_kind(ifindex, LinkKind::OlpcMesh, "mesh channel")?;
        Ok(self
            .state
            .get(&ifindex)
            .map_or(0, |state| state.mesh_channel))
    }

    fn mesh_set_channel(&mut self, ifindex: i32, channel: u32) -> Result<()> {
        self.require_kind(ifindex, LinkKind::OlpcMesh, "mesh channel")?;
        if !(1..=14).contains(&channel) {
            return Err(Error::InvalidArgument(format!(
                "mesh channel {} out of range (1-14)",
                channel
            )));
        }
        self.state_mut(ifindex).mesh_channel = channel;
        Ok(())
    }

    fn mesh_set_ssid(&mut self, ifindex: i32, ssid: &[u8]) -> Result<()> {
        self.require_kind(ifindex, LinkKind::OlpcMesh, "mesh ssid")?;
        if ssid.len() > MESH_SSID_MAX {
            return Err(Error::InvalidArgument(format!(
                "ssid length {} exceeds {}",
                ssid.len(),
                MESH_SSID_MAX
            )));
        }
        self.state_mut(ifindex).mesh_ssid = ssid.to_vec();
        Ok(())
    }

    fn infiniband_partition_add(&mut self, parent: i32, p_key: u16) -> Result<ObjectRef> {
        let lower = self
            .require_kind(parent, LinkKind::Infiniband, "partition add")?
            .clone();

        let name = format!("{}.{:04x}", lower.name, p_key);
        ifname::validate(&name).map_err(|e| Error::InvalidArgument(e.to_string()))?;

        let mut link = Link::new(name, LinkKind::Infiniband).with_payload(
            LinkPayload::Infiniband(InfinibandData {
                p_key,
                mode: Some("datagram".to_string()),
            }),
        );
        link.parent = parent;
        link.mtu = lower.mtu;
        self.insert_link(link)
    }

    fn infiniband_partition_delete(&mut self, parent: i32, p_key: u16) -> Result<()> {
        let child = self
            .cache
            .lookup(ObjectKind::Link, None)
            .filter_map(|obj| obj.as_link())
            .find(|link| {
                link.parent == parent
                    && link
                        .payload
                        .as_ref()
                        .and_then(LinkPayload::as_infiniband)
                        .is_some_and(|ib| ib.p_key == p_key)
            })
            .map(|link| link.ifindex);

        match child {
            Some(ifindex) => self.link_delete(ifindex),
            None => Err(Error::NotFound {
                what: format!("partition {:04x} of ifindex {}", p_key, parent),
            }),
        }
    }
}
