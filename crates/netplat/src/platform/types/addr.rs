//! Address constants.

/// Address families.
pub const AF_INET: u8 = libc::AF_INET as u8;
pub const AF_INET6: u8 = libc::AF_INET6 as u8;

/// Infinity lifetime value (0xFFFFFFFF).
pub const INFINITY_LIFE_TIME: u32 = 0xFFFF_FFFF;

/// Address flags (IFA_F_*).
pub mod ifa_flags {
    pub const SECONDARY: u32 = 0x01;
    pub const NODAD: u32 = 0x02;
    pub const OPTIMISTIC: u32 = 0x04;
    pub const DADFAILED: u32 = 0x08;
    pub const HOMEADDRESS: u32 = 0x10;
    pub const DEPRECATED: u32 = 0x20;
    pub const TENTATIVE: u32 = 0x40;
    pub const PERMANENT: u32 = 0x80;
    pub const MANAGETEMPADDR: u32 = 0x100;
    pub const NOPREFIXROUTE: u32 = 0x200;
}

/// Format address flags the way `ip addr` does.
pub fn format_flags(flags: u32) -> Vec<&'static str> {
    const NAMES: &[(u32, &str)] = &[
        (ifa_flags::SECONDARY, "secondary"),
        (ifa_flags::NODAD, "nodad"),
        (ifa_flags::OPTIMISTIC, "optimistic"),
        (ifa_flags::DADFAILED, "dadfailed"),
        (ifa_flags::HOMEADDRESS, "home"),
        (ifa_flags::DEPRECATED, "deprecated"),
        (ifa_flags::TENTATIVE, "tentative"),
        (ifa_flags::PERMANENT, "permanent"),
        (ifa_flags::MANAGETEMPADDR, "mngtmpaddr"),
        (ifa_flags::NOPREFIXROUTE, "noprefixroute"),
    ];

    NAMES
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| *name)
        .collect()
}
