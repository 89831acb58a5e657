//! Route integration tests.
//!
//! Replace semantics and gateway reachability.

use std::net::Ipv4Addr;

use netplat::Result;
use netplat::platform::object::{Ip4Route, Ip6Route, PlatformObject};
use netplat::platform::{Error, NlmFlags, ObjectKind, Platform};

use crate::common::{count_on, ethernet_setup};

fn v4(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

#[test]
fn test_gateway_reachability() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;

    platform.ip4_route_add(NlmFlags::REPLACE, Ip4Route::new(v4("10.0.0.0"), 24).ifindex(eth0))?;
    platform.ip4_route_add(
        NlmFlags::REPLACE,
        Ip4Route::new(v4("0.0.0.0"), 0)
            .ifindex(eth0)
            .gateway(v4("10.0.0.1")),
    )?;

    let err = platform
        .ip4_route_add(
            NlmFlags::REPLACE,
            Ip4Route::new(v4("0.0.0.0"), 0)
                .ifindex(eth0)
                .gateway(v4("192.168.1.1")),
        )
        .unwrap_err();
    assert!(err.is_unreachable());
    assert!(matches!(err, Error::NetworkUnreachable { .. }));

    Ok(())
}

#[test]
fn test_gateway_route_does_not_cover_gateways() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;

    platform.ip4_route_add(NlmFlags::REPLACE, Ip4Route::new(v4("10.0.0.0"), 24).ifindex(eth0))?;
    platform.ip4_route_add(
        NlmFlags::REPLACE,
        Ip4Route::new(v4("172.16.0.0"), 12)
            .ifindex(eth0)
            .gateway(v4("10.0.0.1")),
    )?;

    // 172.16.0.1 is only reachable through another gateway
    let err = platform
        .ip4_route_add(
            NlmFlags::REPLACE,
            Ip4Route::new(v4("192.168.0.0"), 16)
                .ifindex(eth0)
                .gateway(v4("172.16.0.1")),
        )
        .unwrap_err();
    assert!(matches!(err, Error::NetworkUnreachable { .. }));

    // an unspecified gateway still counts as direct
    platform.ip4_route_add(
        NlmFlags::REPLACE,
        Ip4Route::new(v4("172.20.0.0"), 16)
            .ifindex(eth0)
            .gateway(Ipv4Addr::UNSPECIFIED),
    )?;
    platform.ip4_route_add(
        NlmFlags::REPLACE,
        Ip4Route::new(v4("192.168.0.0"), 16)
            .ifindex(eth0)
            .gateway(v4("172.20.0.1")),
    )?;
    assert_eq!(count_on(&platform, ObjectKind::Ip4Route, eth0), 4);

    Ok(())
}

#[test]
fn test_gateway_must_be_on_same_link() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;
    let lo = 1;

    platform.ip4_route_add(NlmFlags::REPLACE, Ip4Route::new(v4("10.0.0.0"), 24).ifindex(lo))?;
    let err = platform
        .ip4_route_add(
            NlmFlags::REPLACE,
            Ip4Route::new(v4("172.16.0.0"), 12)
                .ifindex(eth0)
                .gateway(v4("10.0.0.1")),
        )
        .unwrap_err();
    assert!(err.is_unreachable());

    Ok(())
}

#[test]
fn test_onlink_gateway_skips_check() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;
    platform.ip4_route_add(
        NlmFlags::REPLACE,
        Ip4Route::new(v4("0.0.0.0"), 0)
            .ifindex(eth0)
            .gateway(v4("192.168.1.1"))
            .onlink(),
    )?;
    assert_eq!(count_on(&platform, ObjectKind::Ip4Route, eth0), 1);
    Ok(())
}

#[test]
fn test_ipv6_link_local_gateway() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;
    platform.ip6_route_add(
        NlmFlags::REPLACE,
        Ip6Route::new("::".parse().unwrap(), 0)
            .ifindex(eth0)
            .gateway("fe80::1".parse().unwrap()),
    )?;

    let err = platform
        .ip6_route_add(
            NlmFlags::REPLACE,
            Ip6Route::new("2001:db8:1::".parse().unwrap(), 48)
                .ifindex(eth0)
                .gateway("2001:db8::1".parse().unwrap()),
        )
        .unwrap_err();
    assert!(err.is_unreachable());

    platform.ip6_route_add(
        NlmFlags::REPLACE,
        Ip6Route::new("2001:db8::".parse().unwrap(), 64).ifindex(eth0),
    )?;
    platform.ip6_route_add(
        NlmFlags::REPLACE,
        Ip6Route::new("2001:db8:1::".parse().unwrap(), 48)
            .ifindex(eth0)
            .gateway("2001:db8::1".parse().unwrap()),
    )?;
    assert_eq!(count_on(&platform, ObjectKind::Ip6Route, eth0), 3);

    Ok(())
}

#[test]
fn test_replace_changes_gateway() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;
    platform.ip4_route_add(NlmFlags::REPLACE, Ip4Route::new(v4("10.0.0.0"), 24).ifindex(eth0))?;

    let default_via = |gw: &str| {
        Ip4Route::new(v4("0.0.0.0"), 0)
            .ifindex(eth0)
            .gateway(v4(gw))
    };
    platform.ip4_route_add(NlmFlags::REPLACE, default_via("10.0.0.1"))?;

    let mut changes = platform.subscribe();
    platform.ip4_route_add(NlmFlags::REPLACE | NlmFlags::CREATE, default_via("10.0.0.2"))?;

    let defaults: Vec<_> = platform
        .cache()
        .lookup(ObjectKind::Ip4Route, Some(eth0))
        .filter_map(|obj| obj.as_ip4_route())
        .filter(|route| route.is_default())
        .collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].gateway, Some(v4("10.0.0.2")));

    // the new route is announced before the one it evicted goes away
    let events = changes.drain();
    assert_eq!(events.len(), 2);
    assert!(!events[0].is_removed());
    assert!(events[1].is_removed());
    let evicted = events[1].object().and_then(|obj| obj.as_ip4_route()).unwrap();
    assert_eq!(evicted.gateway, Some(v4("10.0.0.1")));

    Ok(())
}

#[test]
fn test_different_metric_is_separate_slot() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;
    let route = Ip4Route::new(v4("10.0.0.0"), 24).ifindex(eth0);

    platform.ip4_route_add(NlmFlags::REPLACE, route.clone())?;
    platform.ip4_route_add(NlmFlags::REPLACE, route.clone().metric(100))?;
    assert_eq!(count_on(&platform, ObjectKind::Ip4Route, eth0), 2);

    platform.ip_route_delete(&PlatformObject::from(route))?;
    assert_eq!(count_on(&platform, ObjectKind::Ip4Route, eth0), 1);

    Ok(())
}

#[test]
fn test_non_replace_flags_rejected() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;
    let route = Ip4Route::new(v4("10.0.0.0"), 24).ifindex(eth0);

    for flags in [
        NlmFlags::NONE,
        NlmFlags::CREATE,
        NlmFlags::CREATE | NlmFlags::EXCL,
        NlmFlags::REPLACE | NlmFlags::APPEND,
    ] {
        let err = platform.ip4_route_add(flags, route.clone()).unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)), "{} accepted", flags);
    }
    assert_eq!(count_on(&platform, ObjectKind::Ip4Route, eth0), 0);

    Ok(())
}

#[test]
fn test_route_on_missing_link() -> Result<()> {
    let (mut platform, _eth0) = ethernet_setup()?;
    let err = platform
        .ip4_route_add(NlmFlags::REPLACE, Ip4Route::new(v4("10.0.0.0"), 8).ifindex(77))
        .unwrap_err();
    assert!(matches!(err, Error::LinkNotFound { ifindex: 77 }));
    Ok(())
}

#[test]
fn test_delete_absent_route() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;
    let err = platform
        .ip_route_delete(&Ip4Route::new(v4("10.0.0.0"), 8).ifindex(eth0).into())
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}
