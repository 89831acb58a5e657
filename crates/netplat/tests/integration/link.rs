//! Link integration tests.
//!
//! Link creation, carrier derivation through controllers, port handling
//! and cascading deletion.

use netplat::Result;
use netplat::platform::link::{BondLink, BridgeLink, GenericLink, VlanLink, VxlanLink};
use netplat::platform::object::payload::{BridgePortData, LinkPayload};
use netplat::platform::object::{Ip4Address, Ip4Route, PortData};
use netplat::platform::types::link::{LinkKind, iff};
use netplat::platform::{Error, FakePlatform, NlmFlags, ObjectKind, Platform};

use crate::common::{bridge_setup, count_on, link};

#[test]
fn test_bridge_port_scenario() -> Result<()> {
    let (mut platform, br0, eth0) = bridge_setup()?;

    let bridge = link(&platform, "br0");
    assert!(!bridge.is_up());
    assert!(!bridge.connected);
    assert_connected!(platform, "eth0", true);

    platform.link_attach_port(br0, eth0)?;
    assert_eq!(link(&platform, "eth0").controller, br0);
    assert!(matches!(link(&platform, "eth0").port, Some(PortData::Bridge(_))));
    // a down bridge has no carrier, whatever its ports do
    assert_connected!(platform, "br0", false);

    platform.link_change_flags(br0, iff::UP, iff::UP)?;
    assert_connected!(platform, "br0", true);
    assert!(link(&platform, "br0").is_lower_up());

    Ok(())
}

#[test]
fn test_release_last_port_drops_carrier() -> Result<()> {
    let (mut platform, br0, eth0) = bridge_setup()?;
    platform.link_attach_port(br0, eth0)?;
    platform.link_set_up(br0)?;
    assert_connected!(platform, "br0", true);

    platform.link_release_port(br0, eth0)?;
    assert!(link(&platform, "br0").is_up());
    assert_connected!(platform, "br0", false);
    assert_eq!(link(&platform, "eth0").controller, 0);
    assert!(link(&platform, "eth0").port.is_none());

    Ok(())
}

#[test]
fn test_port_carrier_propagates_to_controller() -> Result<()> {
    let (mut platform, br0, eth0) = bridge_setup()?;
    platform.link_set_up(br0)?;
    platform.link_attach_port(br0, eth0)?;
    assert_connected!(platform, "br0", true);

    platform.link_set_down(eth0)?;
    assert_connected!(platform, "br0", false);

    platform.link_set_up(eth0)?;
    assert_connected!(platform, "br0", true);

    Ok(())
}

#[test]
fn test_bond_port_forced_up() -> Result<()> {
    let mut platform = FakePlatform::new();
    let bond0 = platform.link_add(&BondLink::new("bond0").up())?.ifindex();
    let eth0 = platform.link_add(&GenericLink::ethernet("eth0"))?.ifindex();
    assert_connected!(platform, "bond0", false);

    platform.link_attach_port(bond0, eth0)?;
    let port = link(&platform, "eth0");
    assert!(port.is_up());
    assert!(port.is_port());
    assert_connected!(platform, "bond0", true);

    Ok(())
}

#[test]
fn test_attach_twice_is_idempotent() -> Result<()> {
    let (mut platform, br0, eth0) = bridge_setup()?;
    let br1 = platform.link_add(&BridgeLink::new("br1"))?.ifindex();

    platform.link_attach_port(br0, eth0)?;
    platform.link_attach_port(br0, eth0)?;
    let err = platform.link_attach_port(br1, eth0).unwrap_err();
    assert!(err.is_already_exists());

    Ok(())
}

#[test]
fn test_release_from_wrong_controller() -> Result<()> {
    let (mut platform, br0, eth0) = bridge_setup()?;
    let err = platform.link_release_port(br0, eth0).unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[test]
fn test_change_port_data() -> Result<()> {
    let (mut platform, br0, eth0) = bridge_setup()?;

    let data = PortData::Bridge(BridgePortData {
        path_cost: 42,
        ..Default::default()
    });
    assert!(platform.link_change_port_data(eth0, data.clone()).is_err());

    platform.link_attach_port(br0, eth0)?;
    platform.link_change_port_data(eth0, data.clone())?;
    assert_eq!(link(&platform, "eth0").port, Some(data));

    let bond_data = PortData::default_for(LinkKind::Bond).unwrap();
    assert!(matches!(
        platform.link_change_port_data(eth0, bond_data),
        Err(Error::InvalidArgument(_))
    ));

    Ok(())
}

#[test]
fn test_delete_cascades_addresses_and_routes() -> Result<()> {
    let (mut platform, _br0, eth0) = bridge_setup()?;

    platform.ip4_address_add(Ip4Address::new(eth0, "192.168.1.10".parse().unwrap(), 24))?;
    platform.ip4_address_add(Ip4Address::new(eth0, "192.168.2.10".parse().unwrap(), 24))?;
    platform.ip4_route_add(
        NlmFlags::REPLACE,
        Ip4Route::new("192.168.1.0".parse().unwrap(), 24).ifindex(eth0),
    )?;
    platform.ip4_route_add(
        NlmFlags::REPLACE,
        Ip4Route::new("0.0.0.0".parse().unwrap(), 0)
            .ifindex(eth0)
            .gateway("192.168.1.1".parse().unwrap()),
    )?;
    assert_eq!(count_on(&platform, ObjectKind::Ip4Address, eth0), 2);
    assert_eq!(count_on(&platform, ObjectKind::Ip4Route, eth0), 2);
    assert_eq!(count_on(&platform, ObjectKind::Ip6Address, eth0), 1);

    platform.link_delete(eth0)?;
    assert!(platform.link_get(eth0).is_none());
    for kind in [
        ObjectKind::Ip4Address,
        ObjectKind::Ip6Address,
        ObjectKind::Ip4Route,
        ObjectKind::Ip6Route,
    ] {
        assert_eq!(count_on(&platform, kind, eth0), 0, "{} left behind", kind);
    }

    Ok(())
}

#[test]
fn test_delete_controller_releases_ports() -> Result<()> {
    let (mut platform, br0, eth0) = bridge_setup()?;
    platform.link_attach_port(br0, eth0)?;

    platform.link_delete(br0)?;
    let port = link(&platform, "eth0");
    assert_eq!(port.controller, 0);
    assert!(port.port.is_none());
    assert!(port.connected);

    Ok(())
}

#[test]
fn test_delete_port_updates_controller() -> Result<()> {
    let (mut platform, br0, eth0) = bridge_setup()?;
    platform.link_set_up(br0)?;
    platform.link_attach_port(br0, eth0)?;
    assert_connected!(platform, "br0", true);

    platform.link_delete(eth0)?;
    assert_connected!(platform, "br0", false);

    Ok(())
}

#[test]
fn test_delete_missing_link() {
    let mut platform = FakePlatform::new();
    let err = platform.link_delete(42).unwrap_err();
    assert!(matches!(err, Error::LinkNotFound { ifindex: 42 }));
}

#[test]
fn test_vlan_on_named_parent() -> Result<()> {
    let mut platform = FakePlatform::new();
    let eth0 = platform.link_add(&GenericLink::ethernet("eth0"))?.ifindex();
    let vlan = platform.link_add(&VlanLink::new("eth0.100", "eth0", 100).up())?;

    let vlan = vlan.as_link().unwrap();
    assert_eq!(vlan.parent, eth0);
    assert_eq!(vlan.kind, LinkKind::Vlan);
    let data = vlan.payload.as_ref().and_then(LinkPayload::as_vlan).unwrap();
    assert_eq!(data.id, 100);

    Ok(())
}

#[test]
fn test_change_payload_replaces_whole_block() -> Result<()> {
    let mut platform = FakePlatform::new();
    let vx = platform
        .link_add(&VxlanLink::new("vxlan0", 42).port(4789))?
        .ifindex();

    let Some(LinkPayload::Vxlan(mut data)) = link(&platform, "vxlan0").payload.clone() else {
        panic!("vxlan0 should carry a vxlan payload");
    };
    data.id = 43;
    platform.link_change_payload(vx, LinkPayload::Vxlan(data))?;

    let Some(LinkPayload::Vxlan(data)) = &link(&platform, "vxlan0").payload else {
        panic!("vxlan0 should carry a vxlan payload");
    };
    assert_eq!(data.id, 43);
    assert_eq!(data.dst_port, 4789);

    Ok(())
}

#[test]
fn test_change_payload_kind_mismatch() -> Result<()> {
    let mut platform = FakePlatform::new();
    let vx = platform.link_add(&VxlanLink::new("vxlan0", 42))?.ifindex();
    let err = platform
        .link_change_payload(vx, LinkPayload::Vlan(Default::default()))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    Ok(())
}

#[test]
fn test_set_mtu_and_address() -> Result<()> {
    let mut platform = FakePlatform::new();
    let eth0 = platform.link_add(&GenericLink::ethernet("eth0"))?.ifindex();

    platform.link_set_mtu(eth0, 9000)?;
    platform.link_set_address(eth0, &[0x02, 0, 0, 0, 0, 0x01])?;
    let eth = link(&platform, "eth0");
    assert_eq!(eth.mtu, 9000);
    assert_eq!(eth.address.as_deref(), Some(&[0x02, 0, 0, 0, 0, 0x01][..]));

    assert!(platform.link_set_mtu(eth0, 0).is_err());
    assert!(platform.link_set_address(eth0, &[]).is_err());

    Ok(())
}
