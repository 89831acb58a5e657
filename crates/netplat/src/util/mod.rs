//! Shared utilities for netplat.

pub mod addr;
pub mod ifname;

pub use addr::{format_mac, parse_addr, parse_mac, parse_prefix};
