//! Address parsing, formatting and prefix arithmetic.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Error type for address parsing.
#[derive(Debug, thiserror::Error)]
pub enum AddrError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid prefix length: {0}")]
    InvalidPrefix(String),

    #[error("invalid MAC address: {0}")]
    InvalidMac(String),
}

pub type Result<T> = std::result::Result<T, AddrError>;

/// Parse an IP address from string.
pub fn parse_addr(s: &str) -> Result<IpAddr> {
    s.parse()
        .map_err(|_| AddrError::InvalidAddress(s.to_string()))
}

/// Parse `addr[/plen]`. Without a prefix length the host prefix is used.
pub fn parse_prefix(s: &str) -> Result<(IpAddr, u8)> {
    let (addr, plen) = match s.split_once('/') {
        Some((addr, plen)) => (addr, Some(plen)),
        None => (s, None),
    };
    let addr = parse_addr(addr)?;
    let max = max_plen(&addr);
    let plen = match plen {
        None => max,
        Some(plen) => match plen.parse::<u8>() {
            Ok(n) if n <= max => n,
            Ok(n) => {
                return Err(AddrError::InvalidPrefix(format!("{} (max {})", n, max)));
            }
            Err(_) => return Err(AddrError::InvalidPrefix(plen.to_string())),
        },
    };
    Ok((addr, plen))
}

/// Maximum prefix length for the family of `addr`.
pub fn max_plen(addr: &IpAddr) -> u8 {
    if addr.is_ipv4() { 32 } else { 128 }
}

/// Parse a colon separated MAC address.
pub fn parse_mac(s: &str) -> Result<[u8; 6]> {
    let invalid = || AddrError::InvalidMac(s.to_string());
    let mut mac = [0u8; 6];
    let mut octets = s.split(':');
    for byte in mac.iter_mut() {
        let octet = octets
            .next()
            .filter(|o| (1..=2).contains(&o.len()))
            .ok_or_else(invalid)?;
        *byte = u8::from_str_radix(octet, 16).map_err(|_| invalid())?;
    }
    if octets.next().is_some() {
        return Err(invalid());
    }
    Ok(mac)
}

/// Format a hardware address (any length, colon separated).
pub fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// IPv4 netmask for a prefix length (clamped to 32).
pub fn ipv4_netmask(prefix_len: u8) -> Ipv4Addr {
    match prefix_len {
        0 => Ipv4Addr::UNSPECIFIED,
        p if p >= 32 => Ipv4Addr::BROADCAST,
        p => Ipv4Addr::from(!0u32 << (32 - p)),
    }
}

/// Clear the host bits of an IPv4 address.
pub fn ipv4_network(addr: Ipv4Addr, prefix_len: u8) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(addr) & u32::from(ipv4_netmask(prefix_len)))
}

/// Clear the host bits of an IPv6 address.
pub fn ipv6_network(addr: Ipv6Addr, prefix_len: u8) -> Ipv6Addr {
    let mask = match prefix_len {
        0 => 0u128,
        p if p >= 128 => !0u128,
        p => !0u128 << (128 - p),
    };
    Ipv6Addr::from(u128::from(addr) & mask)
}

/// Check if an IPv4 address is in a given prefix.
pub fn ipv4_in_prefix(addr: Ipv4Addr, prefix_addr: Ipv4Addr, prefix_len: u8) -> bool {
    if prefix_len > 32 {
        return false;
    }
    ipv4_network(addr, prefix_len) == ipv4_network(prefix_addr, prefix_len)
}

/// Check if an IPv6 address is in a given prefix.
pub fn ipv6_in_prefix(addr: Ipv6Addr, prefix_addr: Ipv6Addr, prefix_len: u8) -> bool {
    if prefix_len > 128 {
        return false;
    }
    ipv6_network(addr, prefix_len) == ipv6_network(prefix_addr, prefix_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefix() {
        let (addr, prefix) = parse_prefix("192.168.1.0/24").unwrap();
        assert_eq!(addr, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 0)));
        assert_eq!(prefix, 24);

        let (addr, prefix) = parse_prefix("2001:db8::1").unwrap();
        assert_eq!(addr, "2001:db8::1".parse::<IpAddr>().unwrap());
        assert_eq!(prefix, 128);

        assert!(parse_prefix("10.0.0.0/33").is_err());
        assert!(parse_prefix("10.0.0/8").is_err());
    }

    #[test]
    fn test_parse_mac() {
        let mac = parse_mac("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(mac, [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert!(parse_mac("aa:bb:cc").is_err());
        assert!(parse_mac("aa:bb:cc:dd:ee:ff:00").is_err());
        assert!(parse_mac("aa:bb:cc:dd:ee:fff").is_err());
        assert_eq!(format_mac(&mac), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_ipv4_network() {
        assert_eq!(ipv4_netmask(24), Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(ipv4_netmask(0), Ipv4Addr::UNSPECIFIED);
        assert_eq!(ipv4_netmask(40), Ipv4Addr::BROADCAST);
        assert_eq!(
            ipv4_network(Ipv4Addr::new(10, 1, 2, 3), 16),
            Ipv4Addr::new(10, 1, 0, 0)
        );
    }

    #[test]
    fn test_in_prefix() {
        let net = Ipv4Addr::new(10, 0, 0, 0);
        assert!(ipv4_in_prefix(Ipv4Addr::new(10, 0, 0, 1), net, 24));
        assert!(!ipv4_in_prefix(Ipv4Addr::new(192, 168, 1, 1), net, 24));
        assert!(ipv4_in_prefix(Ipv4Addr::new(192, 168, 1, 1), net, 0));

        let net6: Ipv6Addr = "2001:db8::".parse().unwrap();
        assert!(ipv6_in_prefix("2001:db8::42".parse().unwrap(), net6, 64));
        assert!(!ipv6_in_prefix("2001:db9::42".parse().unwrap(), net6, 64));
    }
}
