//! Script line commands.
//!
//! Each script line is parsed with clap, as if it were the argument list of
//! a command, and then applied to a [`Platform`].

pub mod address;
pub mod link;
pub mod route;
pub mod sysctl;

use anyhow::bail;
use clap::{Parser, Subcommand};
use netplat::Platform;
use netplat::platform::InterfaceRef;

#[derive(Parser, Debug)]
#[command(name = "platsim", no_binary_name = true, disable_help_subcommand = true)]
struct ScriptLine {
    #[command(subcommand)]
    step: Step,
}

/// One operation of a script.
#[derive(Subcommand, Debug)]
pub enum Step {
    /// Manage links.
    #[command(visible_alias = "l")]
    Link(link::LinkCmd),

    /// Manage IP addresses.
    #[command(visible_alias = "a", visible_alias = "addr")]
    Address(address::AddressCmd),

    /// Manage routes.
    #[command(visible_alias = "r")]
    Route(route::RouteCmd),

    /// Read and write sysctl values.
    Sysctl(sysctl::SysctlCmd),
}

impl Step {
    /// Apply the step. Some steps produce a value to report.
    pub fn run(self, platform: &mut dyn Platform) -> anyhow::Result<Option<String>> {
        match self {
            Self::Link(cmd) => cmd.run(platform),
            Self::Address(cmd) => cmd.run(platform).map(|_| None),
            Self::Route(cmd) => cmd.run(platform).map(|_| None),
            Self::Sysctl(cmd) => cmd.run(platform),
        }
    }
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<Step>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    match ScriptLine::try_parse_from(line.split_whitespace()) {
        Ok(parsed) => Ok(Some(parsed.step)),
        Err(err) => bail!("{}", err.render().to_string().trim_end()),
    }
}

/// Resolve an interface name (or ifindex) to an ifindex.
pub fn resolve(platform: &dyn Platform, dev: &str) -> anyhow::Result<i32> {
    let iface = match dev.parse::<i32>() {
        Ok(index) => InterfaceRef::index(index),
        Err(_) => InterfaceRef::name(dev),
    };
    Ok(platform.resolve(&iface)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_blank_and_comments() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# link add dummy d0").unwrap().is_none());
    }

    #[test]
    fn test_parse_steps() {
        assert!(matches!(
            parse_line("link add bridge br0 --up").unwrap(),
            Some(Step::Link(_))
        ));
        assert!(matches!(
            parse_line("addr add 10.0.0.1/24 --dev eth0").unwrap(),
            Some(Step::Address(_))
        ));
        assert!(matches!(
            parse_line("r add default --via 10.0.0.1 --dev eth0").unwrap(),
            Some(Step::Route(_))
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("frobnicate").is_err());
        assert!(parse_line("link add vlan v0").is_err());
    }
}
