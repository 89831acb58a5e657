//! `route` script command.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use anyhow::bail;
use clap::{Args, Subcommand};
use netplat::Platform;
use netplat::platform::object::{Ip4Route, Ip6Route, PlatformObject};
use netplat::platform::NlmFlags;
use netplat::util::parse_prefix;

use super::resolve;

#[derive(Args, Debug)]
pub struct RouteCmd {
    #[command(subcommand)]
    action: RouteAction,
}

/// Route selectors shared by add and delete.
#[derive(Args, Debug)]
struct RouteArgs {
    /// Destination prefix (e.g., 10.0.0.0/8 or default).
    destination: String,

    /// Gateway address.
    #[arg(long, short)]
    via: Option<IpAddr>,

    /// Output device.
    #[arg(long, short)]
    dev: Option<String>,

    /// Routing table id.
    #[arg(long)]
    table: Option<u32>,

    /// Route metric/priority.
    #[arg(long)]
    metric: Option<u32>,

    /// Gateway is directly reachable on the device.
    #[arg(long)]
    onlink: bool,

    /// IPv6 default route.
    #[arg(short = '6')]
    ipv6: bool,
}

#[derive(Subcommand, Debug)]
enum RouteAction {
    /// Add or replace a route.
    #[command(visible_alias = "replace")]
    Add(RouteArgs),

    /// Delete a route.
    Del(RouteArgs),
}

impl RouteCmd {
    pub fn run(self, platform: &mut dyn Platform) -> anyhow::Result<()> {
        match self.action {
            RouteAction::Add(args) => {
                let route = args.build(platform)?;
                platform.ip_route_add(NlmFlags::REPLACE, route)?;
            }
            RouteAction::Del(args) => {
                let route = args.build(platform)?;
                platform.ip_route_delete(&route)?;
            }
        }
        Ok(())
    }
}

impl RouteArgs {
    fn build(&self, platform: &dyn Platform) -> anyhow::Result<PlatformObject> {
        let ifindex = match &self.dev {
            Some(dev) => resolve(platform, dev)?,
            None => 0,
        };

        let v6_default = self.ipv6 || matches!(self.via, Some(IpAddr::V6(_)));
        let (network, plen) = match self.destination.as_str() {
            "default" if v6_default => (IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
            "default" => (IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            dst => parse_prefix(dst)?,
        };

        let route = match (network, self.via) {
            (IpAddr::V4(network), None | Some(IpAddr::V4(_))) => {
                let mut route = Ip4Route::new(network, plen).ifindex(ifindex);
                if let Some(IpAddr::V4(gw)) = self.via {
                    route = route.gateway(gw);
                }
                if let Some(table) = self.table {
                    route = route.table(table);
                }
                if let Some(metric) = self.metric {
                    route = route.metric(metric);
                }
                if self.onlink {
                    route = route.onlink();
                }
                PlatformObject::from(route)
            }
            (IpAddr::V6(network), None | Some(IpAddr::V6(_))) => {
                if self.onlink {
                    bail!("onlink is only supported for IPv4 routes");
                }
                let mut route = Ip6Route::new(network, plen).ifindex(ifindex);
                if let Some(IpAddr::V6(gw)) = self.via {
                    route = route.gateway(gw);
                }
                if let Some(table) = self.table {
                    route = route.table(table);
                }
                if let Some(metric) = self.metric {
                    route = route.metric(metric);
                }
                PlatformObject::from(route)
            }
            _ => bail!("gateway family does not match {}", self.destination),
        };
        Ok(route)
    }
}
