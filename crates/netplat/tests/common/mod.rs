//! Common test utilities for integration tests.

use std::net::{Ipv4Addr, Ipv6Addr};

use netplat::Result;
use netplat::platform::link::{BridgeLink, GenericLink};
use netplat::platform::object::Link;
use netplat::platform::{FakePlatform, ObjectKind, Platform};

/// Assert the derived carrier state of a link looked up by name.
#[macro_export]
macro_rules! assert_connected {
    ($platform:expr, $name:expr, $expected:expr) => {{
        let link = $platform
            .link_get_by_name($name)
            .unwrap_or_else(|| panic!("{} should exist", $name));
        assert_eq!(
            link.connected, $expected,
            "{} connected should be {}",
            $name, $expected
        );
    }};
}

/// A platform with a down bridge `br0` and an up ethernet `eth0`.
///
/// Returns `(platform, br0, eth0)` ifindexes.
pub fn bridge_setup() -> Result<(FakePlatform, i32, i32)> {
    let mut platform = FakePlatform::new();
    let br0 = platform.link_add(&BridgeLink::new("br0"))?.ifindex();
    let eth0 = platform
        .link_add(&GenericLink::ethernet("eth0").up())?
        .ifindex();
    Ok((platform, br0, eth0))
}

/// A platform with one up ethernet link `eth0`.
pub fn ethernet_setup() -> Result<(FakePlatform, i32)> {
    let mut platform = FakePlatform::new();
    let eth0 = platform
        .link_add(&GenericLink::ethernet("eth0").up())?
        .ifindex();
    Ok((platform, eth0))
}

/// Look up a link that must exist.
pub fn link<'a>(platform: &'a FakePlatform, name: &str) -> &'a Link {
    platform
        .link_get_by_name(name)
        .unwrap_or_else(|| panic!("{} should exist", name))
}

/// IPv4 addresses on `ifindex`, in identity order.
pub fn ip4_addresses(platform: &FakePlatform, ifindex: i32) -> Vec<Ipv4Addr> {
    platform
        .cache()
        .lookup(ObjectKind::Ip4Address, Some(ifindex))
        .filter_map(|obj| obj.as_ip4_address())
        .map(|addr| addr.address)
        .collect()
}

/// IPv6 addresses on `ifindex`, in identity order.
pub fn ip6_addresses(platform: &FakePlatform, ifindex: i32) -> Vec<Ipv6Addr> {
    platform
        .cache()
        .lookup(ObjectKind::Ip6Address, Some(ifindex))
        .filter_map(|obj| obj.as_ip6_address())
        .map(|addr| addr.address)
        .collect()
}

/// Number of objects of `kind` on `ifindex`.
pub fn count_on(platform: &FakePlatform, kind: ObjectKind, ifindex: i32) -> usize {
    platform.cache().lookup(kind, Some(ifindex)).count()
}
