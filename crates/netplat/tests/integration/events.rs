//! Change notification integration tests.

use netplat::Result;
use netplat::platform::link::{BridgeLink, GenericLink};
use netplat::platform::object::{Ip4Address, Ip4Route};
use netplat::platform::{CacheOp, FakePlatform, NlmFlags, ObjectKind, Platform};
use tokio_stream::StreamExt;

use crate::common::ethernet_setup;

#[test]
fn test_link_add_notifications() -> Result<()> {
    let mut platform = FakePlatform::new();
    let mut changes = platform.subscribe();

    let eth0 = platform
        .link_add(&GenericLink::ethernet("eth0").up())?
        .ifindex();

    let events = changes.drain();
    let summary: Vec<(CacheOp, ObjectKind)> = events.iter().map(|c| (c.op, c.kind)).collect();
    assert_eq!(
        summary,
        vec![
            (CacheOp::Added, ObjectKind::Link),
            (CacheOp::Added, ObjectKind::Ip6Address),
        ]
    );
    assert!(events.iter().all(|c| c.ifindex() == eth0));
    assert!(events[0].as_link().unwrap().connected);

    Ok(())
}

#[test]
fn test_cascade_delete_link_first() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;
    platform.ip4_address_add(Ip4Address::new(eth0, "10.0.0.2".parse().unwrap(), 24))?;
    platform.ip4_route_add(
        NlmFlags::REPLACE,
        Ip4Route::new("10.0.0.0".parse().unwrap(), 24).ifindex(eth0),
    )?;

    let mut changes = platform.subscribe();
    platform.link_delete(eth0)?;

    let events = changes.drain();
    assert!(events.iter().all(|c| c.op == CacheOp::Removed));
    let kinds: Vec<ObjectKind> = events.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ObjectKind::Link,
            ObjectKind::Ip4Address,
            ObjectKind::Ip6Address,
            ObjectKind::Ip4Route,
        ]
    );

    Ok(())
}

#[test]
fn test_controller_change_carries_old_and_new() -> Result<()> {
    let mut platform = FakePlatform::new();
    let br0 = platform.link_add(&BridgeLink::new("br0").up())?.ifindex();
    let eth0 = platform
        .link_add(&GenericLink::ethernet("eth0").up())?
        .ifindex();

    let mut changes = platform.subscribe();
    platform.link_attach_port(br0, eth0)?;

    let bridge_change = changes
        .drain()
        .into_iter()
        .find(|c| c.is_link() && c.ifindex() == br0)
        .expect("bridge should be re-announced");
    assert_eq!(bridge_change.op, CacheOp::Updated);
    let old = bridge_change.old.as_ref().and_then(|o| o.as_link()).unwrap();
    let new = bridge_change.new.as_ref().and_then(|o| o.as_link()).unwrap();
    assert!(!old.connected);
    assert!(new.connected);

    Ok(())
}

#[test]
fn test_noop_change_is_silent() -> Result<()> {
    let (mut platform, eth0) = ethernet_setup()?;
    let mut changes = platform.subscribe();

    platform.link_set_up(eth0)?;
    assert!(changes.try_next_change().is_none());

    Ok(())
}

#[test]
fn test_independent_subscribers() -> Result<()> {
    let mut platform = FakePlatform::new();
    let mut early = platform.subscribe();
    platform.link_add(&GenericLink::dummy("d0"))?;
    let mut late = platform.subscribe();
    platform.link_add(&GenericLink::dummy("d1"))?;

    assert_eq!(early.drain().len(), 2);
    assert_eq!(late.drain().len(), 1);

    Ok(())
}

#[test]
fn test_bounded_subscriber_resyncs_from_cache() -> Result<()> {
    let mut platform = FakePlatform::new();
    let mut bounded = platform.subscribe_bounded(2);
    let mut unbounded = platform.subscribe();

    for name in ["d0", "d1", "d2"] {
        platform.link_add(&GenericLink::dummy(name))?;
    }

    assert!(bounded.is_lagged());
    assert_eq!(bounded.drain().len(), 2);
    assert!(bounded.try_next_change().is_none());
    assert_eq!(unbounded.drain().len(), 3);

    // the cache still has everything the lagging subscriber missed
    assert!(platform.link_get_by_name("d2").is_some());
    assert_eq!(platform.cache().count(ObjectKind::Link), 4);

    Ok(())
}

#[tokio::test]
async fn test_stream_consumer() -> Result<()> {
    let mut platform = FakePlatform::new();
    let stream = platform.subscribe();

    platform.link_add(&GenericLink::dummy("d0"))?;
    platform.link_add(&GenericLink::dummy("d1"))?;
    drop(platform);

    let names: Vec<String> = stream
        .filter_map(|change| change.as_link().map(|link| link.name.clone()))
        .collect()
        .await;
    assert_eq!(names, vec!["d0".to_string(), "d1".to_string()]);

    Ok(())
}
