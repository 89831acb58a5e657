//! Dump reconciliation and sysctl simulation tests.

use netplat::Result;
use netplat::platform::link::{BridgeLink, GenericLink};
use netplat::platform::object::payload::{BridgeData, LinkPayload};
use netplat::platform::object::{Ip4Route, Link, PlatformObject};
use netplat::platform::types::link::LinkKind;
use netplat::platform::{FakePlatform, ObjectKind, Platform};

use crate::common::link;

const VLAN_FILTERING: &str = "/sys/class/net/br0/bridge/vlan_filtering";
const DEFAULT_PVID: &str = "/sys/class/net/br0/bridge/default_pvid";

#[test]
fn test_bridge_sysctls_follow_payload() -> Result<()> {
    let mut platform = FakePlatform::new();
    let br0 = platform
        .link_add(&BridgeLink::new("br0").vlan_filtering(true).vlan_default_pvid(10))?
        .ifindex();
    assert_eq!(platform.sysctl_get(VLAN_FILTERING)?, "1");
    assert_eq!(platform.sysctl_get(DEFAULT_PVID)?, "10");

    let data = BridgeData {
        vlan_filtering: false,
        ..link(&platform, "br0").bridge().cloned().unwrap()
    };
    platform.link_change_payload(br0, LinkPayload::Bridge(data))?;
    assert_eq!(platform.sysctl_get(VLAN_FILTERING)?, "0");
    assert_eq!(platform.sysctl_get(DEFAULT_PVID)?, "10");

    Ok(())
}

#[test]
fn test_bridge_delete_clears_sysctls() -> Result<()> {
    let mut platform = FakePlatform::new();
    let br0 = platform.link_add(&BridgeLink::new("br0"))?.ifindex();
    platform.sysctl_set("/proc/sys/net/ipv6/conf/br0/disable_ipv6", "1")?;
    assert_eq!(platform.sysctl().len(), 3);

    platform.link_delete(br0)?;
    assert!(platform.sysctl_get(VLAN_FILTERING).unwrap_err().is_not_found());
    assert!(platform.sysctl_get(DEFAULT_PVID).is_err());
    // only bridge attributes are keyed to the bridge
    assert_eq!(
        platform.sysctl_get("/proc/sys/net/ipv6/conf/br0/disable_ipv6")?,
        "1"
    );

    Ok(())
}

#[test]
fn test_sysctl_round_trip() -> Result<()> {
    let mut platform = FakePlatform::new();
    platform.sysctl_set("/proc/sys/net/ipv4/ip_forward", "1\n")?;
    assert_eq!(platform.sysctl_get("/proc/sys/net/ipv4/ip_forward")?, "1");
    assert!(platform.sysctl_set("/etc/hostname", "x").is_err());
    Ok(())
}

#[test]
fn test_dump_replaces_link_table() -> Result<()> {
    let mut platform = FakePlatform::new();
    platform.link_add(&GenericLink::dummy("d0"))?;

    let mut lo = link(&platform, "lo").clone();
    lo.mtu = 16384;
    let eth7 = Link::new("eth7", LinkKind::Ethernet).with_ifindex(7);
    let report = platform.sync_dump(
        ObjectKind::Link,
        vec![PlatformObject::from(lo), PlatformObject::from(eth7)],
    )?;

    assert_eq!(report.added.len(), 1);
    assert_eq!(report.updated.len(), 1);
    assert_eq!(report.removed.len(), 1);
    assert!(platform.link_get_by_name("d0").is_none());
    assert_eq!(link(&platform, "lo").mtu, 16384);

    // new links continue after the highest dumped ifindex
    let next = platform.link_add(&GenericLink::dummy("d1"))?.ifindex();
    assert_eq!(next, 8);

    Ok(())
}

#[test]
fn test_dump_of_routes() -> Result<()> {
    let mut platform = FakePlatform::new();
    let route = Ip4Route::new("127.0.0.0".parse().unwrap(), 8).ifindex(1);

    let report = platform.sync_dump(ObjectKind::Ip4Route, vec![route.clone().into()])?;
    assert_eq!(report.change_count(), 1);

    let report = platform.sync_dump(ObjectKind::Ip4Route, vec![route.into()])?;
    assert!(report.is_empty());
    assert_eq!(report.unchanged, 1);

    let report = platform.sync_dump(ObjectKind::Ip4Route, Vec::new())?;
    assert_eq!(report.removed.len(), 1);
    assert_eq!(platform.cache().count(ObjectKind::Ip4Route), 0);

    Ok(())
}
