//! `link` script command.

use anyhow::{Context, anyhow};
use clap::{Args, Subcommand};
use netplat::Platform;
use netplat::platform::LinkConfig;
use netplat::platform::link::{BondLink, BridgeLink, GenericLink, VlanLink, VxlanLink};
use netplat::platform::object::payload::BondMode;
use netplat::platform::types::link::LinkKind;
use netplat::util::parse_mac;

use super::resolve;

#[derive(Args, Debug)]
pub struct LinkCmd {
    #[command(subcommand)]
    action: LinkAction,
}

/// Common options for all link types.
#[derive(Args, Debug)]
pub struct CommonLinkArgs {
    /// MTU (Maximum Transmission Unit).
    #[arg(long)]
    pub mtu: Option<u32>,

    /// MAC address.
    #[arg(long)]
    pub address: Option<String>,

    /// Create the link administratively up.
    #[arg(long)]
    pub up: bool,
}

#[derive(Subcommand, Debug)]
enum LinkAction {
    /// Add a link.
    Add {
        #[command(subcommand)]
        link_type: LinkAddType,
    },

    /// Delete a link.
    Del {
        /// Interface name.
        dev: String,
    },

    /// Set link attributes.
    Set {
        /// Interface name.
        dev: String,

        /// Bring interface up.
        #[arg(long)]
        up: bool,

        /// Bring interface down.
        #[arg(long)]
        down: bool,

        /// Set MTU.
        #[arg(long)]
        mtu: Option<u32>,

        /// Set MAC address.
        #[arg(long)]
        address: Option<String>,

        /// Attach to a bridge, bond or team.
        #[arg(long)]
        master: Option<String>,

        /// Release from the current controller.
        #[arg(long)]
        nomaster: bool,
    },

    /// Print one link.
    Show {
        /// Interface name.
        dev: String,
    },
}

/// Link type subcommands.
#[derive(Subcommand, Debug)]
pub enum LinkAddType {
    /// An ethernet device.
    Ethernet {
        name: String,
        #[command(flatten)]
        common: CommonLinkArgs,
    },

    /// A dummy interface.
    Dummy {
        name: String,
        #[command(flatten)]
        common: CommonLinkArgs,
    },

    /// A bridge device.
    Bridge {
        name: String,
        /// Enable Spanning Tree Protocol.
        #[arg(long)]
        stp: bool,
        /// Enable VLAN filtering.
        #[arg(long)]
        vlan_filtering: bool,
        /// Default port VLAN id.
        #[arg(long)]
        pvid: Option<u16>,
        #[command(flatten)]
        common: CommonLinkArgs,
    },

    /// A bonding device.
    Bond {
        name: String,
        /// Bonding mode: balance-rr, active-backup, balance-xor, broadcast, 802.3ad, balance-tlb, balance-alb.
        #[arg(long, default_value = "balance-rr")]
        mode: String,
        /// Link monitoring interval in milliseconds.
        #[arg(long)]
        miimon: Option<u32>,
        #[command(flatten)]
        common: CommonLinkArgs,
    },

    /// A team device.
    Team {
        name: String,
        #[command(flatten)]
        common: CommonLinkArgs,
    },

    /// A VLAN interface.
    Vlan {
        name: String,
        /// Parent interface.
        #[arg(long)]
        link: String,
        /// VLAN ID (1-4094).
        #[arg(long)]
        id: u16,
        #[command(flatten)]
        common: CommonLinkArgs,
    },

    /// A VXLAN interface.
    Vxlan {
        name: String,
        /// VXLAN Network Identifier (VNI).
        #[arg(long)]
        vni: u32,
        /// Underlay interface.
        #[arg(long)]
        link: Option<String>,
        /// Destination UDP port.
        #[arg(long)]
        dstport: Option<u16>,
        #[command(flatten)]
        common: CommonLinkArgs,
    },

    /// An infiniband device.
    Infiniband {
        name: String,
        #[command(flatten)]
        common: CommonLinkArgs,
    },

    /// An infiniband partition of an existing device.
    Partition {
        /// Parent infiniband interface.
        #[arg(long)]
        link: String,
        /// Partition key (hex).
        #[arg(long)]
        pkey: String,
    },
}

/// Apply the common options to a builder.
macro_rules! with_common {
    ($builder:expr, $common:expr) => {{
        let mut builder = $builder;
        if let Some(mtu) = $common.mtu {
            builder = builder.mtu(mtu);
        }
        if let Some(address) = &$common.address {
            builder = builder.address(parse_mac(address)?);
        }
        if $common.up {
            builder = builder.up();
        }
        builder
    }};
}

impl LinkCmd {
    pub fn run(self, platform: &mut dyn Platform) -> anyhow::Result<Option<String>> {
        match self.action {
            LinkAction::Add { link_type } => add_link(platform, link_type).map(|_| None),
            LinkAction::Del { dev } => {
                let ifindex = resolve(platform, &dev)?;
                platform.link_delete(ifindex)?;
                Ok(None)
            }
            LinkAction::Set {
                dev,
                up,
                down,
                mtu,
                address,
                master,
                nomaster,
            } => {
                let ifindex = resolve(platform, &dev)?;
                if let Some(mtu) = mtu {
                    platform.link_set_mtu(ifindex, mtu)?;
                }
                if let Some(address) = address {
                    platform.link_set_address(ifindex, &parse_mac(&address)?)?;
                }
                if nomaster {
                    let controller = platform
                        .link_get(ifindex)
                        .map(|link| link.controller)
                        .unwrap_or(0);
                    if controller > 0 {
                        platform.link_release_port(controller, ifindex)?;
                    }
                }
                if let Some(master) = master {
                    let controller = resolve(platform, &master)?;
                    platform.link_attach_port(controller, ifindex)?;
                }
                if up {
                    platform.link_set_up(ifindex)?;
                }
                if down {
                    platform.link_set_down(ifindex)?;
                }
                Ok(None)
            }
            LinkAction::Show { dev } => {
                let ifindex = resolve(platform, &dev)?;
                Ok(platform.link_get(ifindex).map(|link| link.to_string()))
            }
        }
    }
}

fn add_link(platform: &mut dyn Platform, link_type: LinkAddType) -> anyhow::Result<()> {
    let config: Box<dyn LinkConfig> = match link_type {
        LinkAddType::Ethernet { name, common } => {
            Box::new(with_common!(GenericLink::ethernet(name), common))
        }
        LinkAddType::Dummy { name, common } => {
            Box::new(with_common!(GenericLink::dummy(name), common))
        }
        LinkAddType::Team { name, common } => Box::new(with_common!(GenericLink::team(name), common)),
        LinkAddType::Infiniband { name, common } => Box::new(with_common!(
            GenericLink::new(name, LinkKind::Infiniband),
            common
        )),
        LinkAddType::Bridge {
            name,
            stp,
            vlan_filtering,
            pvid,
            common,
        } => {
            let mut bridge = BridgeLink::new(name).stp(stp).vlan_filtering(vlan_filtering);
            if let Some(pvid) = pvid {
                bridge = bridge.vlan_default_pvid(pvid);
            }
            Box::new(with_common!(bridge, common))
        }
        LinkAddType::Bond {
            name,
            mode,
            miimon,
            common,
        } => {
            let mode =
                BondMode::from_name(&mode).ok_or_else(|| anyhow!("unknown bond mode: {}", mode))?;
            let mut bond = BondLink::new(name).mode(mode);
            if let Some(miimon) = miimon {
                bond = bond.miimon(miimon);
            }
            Box::new(with_common!(bond, common))
        }
        LinkAddType::Vlan {
            name,
            link,
            id,
            common,
        } => Box::new(with_common!(VlanLink::new(name, link, id), common)),
        LinkAddType::Vxlan {
            name,
            vni,
            link,
            dstport,
            common,
        } => {
            let mut vxlan = VxlanLink::new(name, vni);
            if let Some(link) = link {
                vxlan = vxlan.parent(link);
            }
            if let Some(port) = dstport {
                vxlan = vxlan.port(port);
            }
            Box::new(with_common!(vxlan, common))
        }
        LinkAddType::Partition { link, pkey } => {
            let parent = resolve(platform, &link)?;
            let p_key = u16::from_str_radix(pkey.trim_start_matches("0x"), 16)
                .with_context(|| format!("invalid partition key: {}", pkey))?;
            platform.infiniband_partition_add(parent, p_key)?;
            return Ok(());
        }
    };

    platform.link_add(config.as_ref())?;
    Ok(())
}
