//! Integration test entry point.
//!
//! The tests drive [`netplat::FakePlatform`] through the public
//! [`netplat::Platform`] trait only, the same way device logic does.
//!
//! # Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test --test integration
//!
//! # Run specific test module
//! cargo test --test integration route
//!
//! # Run with output
//! cargo test --test integration -- --nocapture
//! ```
//!
//! # Test Organization
//!
//! - `link.rs` - Link creation, carrier derivation, ports and deletion
//! - `address.rs` - IP address management and link-local addresses
//! - `route.rs` - Route replace and gateway reachability
//! - `events.rs` - Change notification ordering
//! - `sync.rs` - Dump reconciliation and sysctl simulation

#[macro_use]
#[path = "common/mod.rs"]
mod common;

#[path = "integration/link.rs"]
mod link;

#[path = "integration/address.rs"]
mod address;

#[path = "integration/route.rs"]
mod route;

#[path = "integration/events.rs"]
mod events;

#[path = "integration/sync.rs"]
mod sync;
