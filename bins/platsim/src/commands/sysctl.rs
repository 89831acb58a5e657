//! `sysctl` script command.

use clap::{Args, Subcommand};
use netplat::Platform;

#[derive(Args, Debug)]
pub struct SysctlCmd {
    #[command(subcommand)]
    action: SysctlAction,
}

#[derive(Subcommand, Debug)]
enum SysctlAction {
    /// Print a value.
    Get {
        /// Path under /proc/sys or /sys/class/net.
        path: String,
    },

    /// Write a value.
    Set {
        /// Path under /proc/sys or /sys/class/net.
        path: String,
        value: String,
    },
}

impl SysctlCmd {
    pub fn run(self, platform: &mut dyn Platform) -> anyhow::Result<Option<String>> {
        match self.action {
            SysctlAction::Get { path } => {
                let value = platform.sysctl_get(&path)?;
                Ok(Some(format!("{} = {}", path, value)))
            }
            SysctlAction::Set { path, value } => {
                platform.sysctl_set(&path, &value)?;
                Ok(None)
            }
        }
    }
}
