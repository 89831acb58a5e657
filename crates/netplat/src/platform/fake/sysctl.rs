//! Simulated sysctl and sysfs key/value store.
//!
//! Paths are parsed into a [`SysctlPath`] so that equivalent spellings map
//! to the same key and per-interface entries can be found again when the
//! interface goes away.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;
use winnow::combinator::{alt, preceded, separated};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{literal, take_while};

use crate::platform::error::{Error, Result};

/// Result type for winnow parsers.
pub type PResult<T> = core::result::Result<T, winnow::error::ErrMode<ContextError>>;

/// A parsed sysctl or sysfs path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SysctlPath {
    /// `/proc/sys/<segments...>`
    Proc(Vec<String>),
    /// `/sys/class/net/<iface>/<attr...>`
    ClassNet { iface: String, attr: Vec<String> },
}

impl SysctlPath {
    /// Parse a path string.
    pub fn parse(path: &str) -> Result<Self> {
        let parsed = parse_path
            .parse(path.trim_end_matches('/'))
            .map_err(|e| Error::InvalidArgument(format!("sysctl path {:?}: {}", path, e)))?;
        for segment in parsed.segments() {
            if segment == "." || segment == ".." {
                return Err(Error::InvalidArgument(format!(
                    "sysctl path {:?}: relative segment",
                    path
                )));
            }
        }
        Ok(parsed)
    }

    fn segments(&self) -> Vec<&str> {
        match self {
            Self::Proc(segments) => segments.iter().map(String::as_str).collect(),
            Self::ClassNet { iface, attr } => std::iter::once(iface)
                .chain(attr)
                .map(String::as_str)
                .collect(),
        }
    }

    /// `/sys/class/net/<iface>/bridge/<key>`
    pub fn bridge(iface: &str, key: &str) -> Self {
        Self::ClassNet {
            iface: iface.to_string(),
            attr: vec!["bridge".to_string(), key.to_string()],
        }
    }

    /// `/proc/sys/net/<family>/conf/<iface>/<key>`
    pub fn ip_conf(family: &str, iface: &str, key: &str) -> Self {
        Self::Proc(
            ["net", family, "conf", iface, key]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    /// The interface this path belongs to, if it is per-interface.
    pub fn iface(&self) -> Option<&str> {
        match self {
            Self::ClassNet { iface, .. } => Some(iface.as_str()),
            Self::Proc(segments) => match segments.as_slice() {
                [net, _family, conf, iface, _, ..]
                    if net == "net" && (conf == "conf" || conf == "neigh") =>
                {
                    Some(iface.as_str())
                }
                _ => None,
            },
        }
    }

    /// Check if this is a bridge attribute of `iface`.
    pub fn is_bridge_attr_of(&self, name: &str) -> bool {
        matches!(self, Self::ClassNet { iface, attr }
            if iface == name && attr.first().is_some_and(|a| a == "bridge"))
    }
}

impl fmt::Display for SysctlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proc(segments) => write!(f, "/proc/sys/{}", segments.join("/")),
            Self::ClassNet { iface, attr } => {
                write!(f, "/sys/class/net/{}/{}", iface, attr.join("/"))
            }
        }
    }
}

fn segment(input: &mut &str) -> PResult<String> {
    take_while(1.., |c: char| c != '/')
        .map(str::to_string)
        .parse_next(input)
}

fn segments(input: &mut &str) -> PResult<Vec<String>> {
    separated(1.., segment, '/').parse_next(input)
}

fn proc_path(input: &mut &str) -> PResult<SysctlPath> {
    preceded(literal("/proc/sys/"), segments)
        .map(SysctlPath::Proc)
        .parse_next(input)
}

fn class_net_path(input: &mut &str) -> PResult<SysctlPath> {
    let iface = preceded(literal("/sys/class/net/"), segment).parse_next(input)?;
    let attr = preceded('/', segments).parse_next(input)?;
    Ok(SysctlPath::ClassNet { iface, attr })
}

fn parse_path(input: &mut &str) -> PResult<SysctlPath> {
    alt((proc_path, class_net_path)).parse_next(input)
}

/// In-memory sysctl values keyed by canonical path.
#[derive(Debug, Default)]
pub struct SysctlStore {
    values: BTreeMap<SysctlPath, String>,
}

impl SysctlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a value.
    pub fn get(&self, path: &str) -> Result<String> {
        let key = SysctlPath::parse(path)?;
        self.values
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                what: format!("sysctl {}", key),
            })
    }

    /// Write a value. Returns true if the stored value changed.
    pub fn set(&mut self, path: &str, value: &str) -> Result<bool> {
        let key = SysctlPath::parse(path)?;
        Ok(self.insert(key, value))
    }

    /// Write a value under an already parsed path.
    pub fn insert(&mut self, key: SysctlPath, value: &str) -> bool {
        let value = value.trim_end_matches('\n');
        if self.values.get(&key).is_some_and(|v| v == value) {
            return false;
        }
        debug!(path = %key, value, "sysctl: set");
        self.values.insert(key, value.to_string());
        true
    }

    /// Remove every bridge attribute of `iface`. Returns the number removed.
    pub fn remove_bridge(&mut self, iface: &str) -> usize {
        let before = self.values.len();
        self.values.retain(|key, _| !key.is_bridge_attr_of(iface));
        let removed = before - self.values.len();
        if removed > 0 {
            debug!(iface, removed, "sysctl: dropped bridge attributes");
        }
        removed
    }

    /// Iterate every key and value in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&SysctlPath, &str)> + '_ {
        self.values.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paths() {
        let path = SysctlPath::parse("/sys/class/net/br0/bridge/vlan_filtering").unwrap();
        assert_eq!(path, SysctlPath::bridge("br0", "vlan_filtering"));
        assert_eq!(path.iface(), Some("br0"));
        assert!(path.is_bridge_attr_of("br0"));
        assert!(!path.is_bridge_attr_of("br1"));

        let path = SysctlPath::parse("/proc/sys/net/ipv6/conf/eth0/disable_ipv6").unwrap();
        assert_eq!(path, SysctlPath::ip_conf("ipv6", "eth0", "disable_ipv6"));
        assert_eq!(path.iface(), Some("eth0"));
        assert_eq!(path.to_string(), "/proc/sys/net/ipv6/conf/eth0/disable_ipv6");

        let path = SysctlPath::parse("/proc/sys/net/ipv4/ip_forward").unwrap();
        assert_eq!(path.iface(), None);
    }

    #[test]
    fn test_parse_rejects() {
        for bad in [
            "",
            "proc/sys/net",
            "/proc/sys/",
            "/proc/sys//net",
            "/sys/class/net/eth0",
            "/etc/passwd",
            "/proc/sys/net/../x",
        ] {
            assert!(SysctlPath::parse(bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_trailing_slash_is_same_key() {
        let mut store = SysctlStore::new();
        store.set("/proc/sys/net/ipv4/ip_forward/", "1\n").unwrap();
        assert_eq!(store.get("/proc/sys/net/ipv4/ip_forward").unwrap(), "1");
    }

    #[test]
    fn test_set_reports_change() {
        let mut store = SysctlStore::new();
        assert!(store.set("/proc/sys/net/ipv4/ip_forward", "1").unwrap());
        assert!(!store.set("/proc/sys/net/ipv4/ip_forward", "1").unwrap());
        assert!(store.set("/proc/sys/net/ipv4/ip_forward", "0").unwrap());
    }

    #[test]
    fn test_get_missing() {
        let store = SysctlStore::new();
        let err = store.get("/proc/sys/net/ipv4/ip_forward").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_remove_bridge() {
        let mut store = SysctlStore::new();
        store.insert(SysctlPath::bridge("br0", "vlan_filtering"), "0");
        store.insert(SysctlPath::bridge("br0", "default_pvid"), "1");
        store.insert(SysctlPath::bridge("br1", "default_pvid"), "1");
        store.insert(SysctlPath::ip_conf("ipv6", "br0", "mtu"), "1500");
        assert_eq!(store.remove_bridge("br0"), 2);
        assert_eq!(store.len(), 2);
    }
}
