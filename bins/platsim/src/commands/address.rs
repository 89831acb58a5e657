//! `address` script command.

use std::net::IpAddr;

use clap::{Args, Subcommand};
use netplat::Platform;
use netplat::platform::object::{Ip4Address, Ip6Address};
use netplat::util::parse_prefix;

use super::resolve;

#[derive(Args, Debug)]
pub struct AddressCmd {
    #[command(subcommand)]
    action: AddressAction,
}

#[derive(Subcommand, Debug)]
enum AddressAction {
    /// Add an address.
    Add {
        /// Address with prefix length (e.g., 192.168.1.1/24).
        address: String,

        /// Device to add the address to.
        #[arg(long, short)]
        dev: String,

        /// Peer address for point-to-point links.
        #[arg(long)]
        peer: Option<IpAddr>,

        /// Address label (IPv4 only).
        #[arg(long)]
        label: Option<String>,

        /// Valid lifetime in seconds.
        #[arg(long)]
        valid_lft: Option<u32>,

        /// Preferred lifetime in seconds.
        #[arg(long)]
        preferred_lft: Option<u32>,
    },

    /// Delete an address.
    Del {
        /// Address with prefix length.
        address: String,

        /// Device to delete the address from.
        #[arg(long, short)]
        dev: String,

        /// Peer address for point-to-point links.
        #[arg(long)]
        peer: Option<IpAddr>,
    },
}

impl AddressCmd {
    pub fn run(self, platform: &mut dyn Platform) -> anyhow::Result<()> {
        match self.action {
            AddressAction::Add {
                address,
                dev,
                peer,
                label,
                valid_lft,
                preferred_lft,
            } => {
                let ifindex = resolve(platform, &dev)?;
                let (address, plen) = parse_prefix(&address)?;
                let lifetimes = valid_lft.map(|valid| (valid, preferred_lft.unwrap_or(valid)));

                match (address, peer) {
                    (IpAddr::V4(address), None | Some(IpAddr::V4(_))) => {
                        let mut addr = Ip4Address::new(ifindex, address, plen);
                        if let Some(IpAddr::V4(peer)) = peer {
                            addr = addr.peer(peer);
                        }
                        if let Some(label) = label {
                            addr = addr.label(label);
                        }
                        if let Some((valid, preferred)) = lifetimes {
                            addr = addr.lifetimes(valid, preferred);
                        }
                        platform.ip4_address_add(addr)?;
                    }
                    (IpAddr::V6(address), None | Some(IpAddr::V6(_))) => {
                        let mut addr = Ip6Address::new(ifindex, address, plen);
                        if let Some(IpAddr::V6(peer)) = peer {
                            addr = addr.peer(peer);
                        }
                        if let Some((valid, preferred)) = lifetimes {
                            addr = addr.lifetimes(valid, preferred);
                        }
                        platform.ip6_address_add(addr)?;
                    }
                    _ => anyhow::bail!("address and peer must be of the same family"),
                }
            }
            AddressAction::Del { address, dev, peer } => {
                let ifindex = resolve(platform, &dev)?;
                let (address, plen) = parse_prefix(&address)?;
                match (address, peer) {
                    (IpAddr::V4(address), None) => {
                        platform.ip4_address_delete(ifindex, address, plen, None)?
                    }
                    (IpAddr::V4(address), Some(IpAddr::V4(peer))) => {
                        platform.ip4_address_delete(ifindex, address, plen, Some(peer))?
                    }
                    (IpAddr::V6(address), None) => {
                        platform.ip6_address_delete(ifindex, address, plen)?
                    }
                    _ => anyhow::bail!("unsupported peer for {}", address),
                }
            }
        }
        Ok(())
    }
}
