//! Address integration tests.

use std::net::{Ipv4Addr, Ipv6Addr};

use netplat::Result;
use netplat::platform::link::GenericLink;
use netplat::platform::object::{Ip4Address, Ip6Address};
use netplat::platform::types::addr::ifa_flags;
use netplat::platform::{Error, FakePlatform, ObjectKind, Platform};

use crate::common::{count_on, ethernet_setup, ip4_addresses, ip6_addresses};

#[test]
fn test_add_and_delete_ipv4() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;
    let addr: Ipv4Addr = "10.1.2.3".parse().unwrap();

    platform.ip4_address_add(Ip4Address::new(eth0, addr, 24).label("eth0:1"))?;
    assert_eq!(ip4_addresses(&platform, eth0), vec![addr]);

    platform.ip4_address_delete(eth0, addr, 24, None)?;
    assert!(ip4_addresses(&platform, eth0).is_empty());

    let err = platform.ip4_address_delete(eth0, addr, 24, None).unwrap_err();
    assert!(err.is_not_found());

    Ok(())
}

#[test]
fn test_readd_updates_lifetimes() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;
    let addr: Ipv4Addr = "10.1.2.3".parse().unwrap();

    platform.ip4_address_add(Ip4Address::new(eth0, addr, 24).lifetimes(300, 200))?;
    platform.ip4_address_add(Ip4Address::new(eth0, addr, 24).lifetimes(600, 400))?;
    assert_eq!(count_on(&platform, ObjectKind::Ip4Address, eth0), 1);

    let stored = platform
        .cache()
        .lookup(ObjectKind::Ip4Address, Some(eth0))
        .find_map(|obj| obj.as_ip4_address())
        .unwrap();
    assert_eq!(stored.lifetime, 600);
    assert_eq!(stored.preferred, 400);

    Ok(())
}

#[test]
fn test_peer_is_part_of_identity() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;
    let local: Ipv4Addr = "10.0.0.1".parse().unwrap();

    platform.ip4_address_add(Ip4Address::new(eth0, local, 32).peer("10.0.0.2".parse().unwrap()))?;
    platform.ip4_address_add(Ip4Address::new(eth0, local, 32).peer("10.0.0.3".parse().unwrap()))?;
    assert_eq!(count_on(&platform, ObjectKind::Ip4Address, eth0), 2);

    platform.ip4_address_delete(eth0, local, 32, Some("10.0.0.2".parse().unwrap()))?;
    assert_eq!(count_on(&platform, ObjectKind::Ip4Address, eth0), 1);

    Ok(())
}

#[test]
fn test_address_needs_link() {
    let mut platform = FakePlatform::new();
    let err = platform
        .ip4_address_add(Ip4Address::new(9, "10.0.0.1".parse().unwrap(), 8))
        .unwrap_err();
    assert!(matches!(err, Error::LinkNotFound { ifindex: 9 }));
}

#[test]
fn test_ipv6_address_with_flags() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;
    let addr: Ipv6Addr = "2001:db8::1".parse().unwrap();

    platform.ip6_address_add(
        Ip6Address::new(eth0, addr, 64)
            .lifetimes(3600, 1800)
            .flags(ifa_flags::NODAD),
    )?;
    assert!(ip6_addresses(&platform, eth0).contains(&addr));

    platform.ip6_address_delete(eth0, addr, 64)?;
    assert!(!ip6_addresses(&platform, eth0).contains(&addr));

    Ok(())
}

#[test]
fn test_link_local_tracks_carrier() -> Result<()> {
    let mut platform = FakePlatform::new();
    let eth0 = platform.link_add(&GenericLink::ethernet("eth0"))?.ifindex();
    let ll = platform.link_local_of(eth0).unwrap();
    assert!(ll.is_unicast_link_local());
    assert!(ip6_addresses(&platform, eth0).is_empty());

    platform.link_set_up(eth0)?;
    assert_eq!(ip6_addresses(&platform, eth0), vec![ll]);

    platform.link_set_down(eth0)?;
    assert!(ip6_addresses(&platform, eth0).is_empty());

    Ok(())
}

#[test]
fn test_link_local_differs_per_link() -> Result<()> {
    let mut platform = FakePlatform::new();
    let a = platform.link_add(&GenericLink::dummy("d0").up())?.ifindex();
    let b = platform.link_add(&GenericLink::dummy("d1").up())?.ifindex();

    let (la, lb) = (ip6_addresses(&platform, a), ip6_addresses(&platform, b));
    assert_eq!(la.len(), 1);
    assert_eq!(lb.len(), 1);
    assert_ne!(la[0], lb[0]);

    Ok(())
}
