//! Kernel network-state model and platform backends.
//!
//! This crate holds the platform layer of a network-configuration daemon:
//! a typed model of links, addresses and routes, an identity-keyed object
//! cache, the [`Platform`](platform::Platform) capability trait, and
//! [`FakePlatform`](platform::FakePlatform), an in-memory backend that
//! simulates the kernel behaviour device logic relies on.
//!
//! # Features
//!
//! - `serde` - Serialize objects and change notifications
//! - `full` - All features enabled
//!
//! # Example
//!
//! ```ignore
//! use netplat::platform::{FakePlatform, Platform};
//! use netplat::platform::link::{BridgeLink, GenericLink};
//!
//! let mut platform = FakePlatform::new();
//! let br0 = platform.link_add(&BridgeLink::new("br0").up())?.ifindex();
//! let eth0 = platform.link_add(&GenericLink::ethernet("eth0").up())?.ifindex();
//!
//! platform.link_attach_port(br0, eth0)?;
//! assert!(platform.link_get(br0).unwrap().connected);
//! ```

pub mod platform;
pub mod util;

// Re-export common types at crate root for convenience
pub use platform::{Error, FakePlatform, Platform, Result};
