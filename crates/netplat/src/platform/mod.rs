//! Platform abstraction for a network-configuration daemon.
//!
//! Device logic never talks to the kernel directly. It reads kernel network
//! state from an [`ObjectCache`] and mutates it through a [`Platform`]
//! backend, which keeps the cache current and publishes every change on a
//! [`ChangeStream`].
//!
//! # Quick Start
//!
//! ```ignore
//! use netplat::platform::{FakePlatform, NlmFlags, Platform};
//! use netplat::platform::link::GenericLink;
//! use netplat::platform::object::{Ip4Address, Ip4Route};
//!
//! let mut platform = FakePlatform::new();
//! let eth0 = platform.link_add(&GenericLink::ethernet("eth0").up())?.ifindex();
//!
//! platform.ip4_address_add(Ip4Address::new(eth0, "192.168.1.10".parse()?, 24))?;
//! platform.ip4_route_add(
//!     NlmFlags::REPLACE,
//!     Ip4Route::new("192.168.1.0".parse()?, 24).ifindex(eth0),
//! )?;
//! ```
//!
//! # Change Notification
//!
//! ```ignore
//! use netplat::platform::{FakePlatform, Platform};
//!
//! let mut platform = FakePlatform::new();
//! let mut changes = platform.subscribe();
//!
//! platform.link_set_down(1)?;
//! for change in changes.drain() {
//!     println!("{}", change);
//! }
//! ```

pub mod backend;
pub mod cache;
mod error;
pub mod events;
pub mod fake;
pub mod id;
pub mod interface_ref;
pub mod link;
pub mod object;
pub mod sync;
pub mod types;

pub use backend::{Duplex, LinkSettings, Platform, WifiMode};
pub use cache::{CacheOp, CacheUpdate, ObjectCache, RemoveTarget};
pub use error::{Error, Result};
pub use events::{CacheChange, ChangeStream, Notifier};
pub use fake::FakePlatform;
pub use id::ObjectId;
pub use interface_ref::InterfaceRef;
pub use link::LinkConfig;
pub use object::{ObjectKind, ObjectRef, PlatformObject};
pub use sync::{DumpSync, SyncReport};
pub use types::route::NlmFlags;
