//! platsim - replay platform operations against the in-memory backend.
//!
//! Reads a script with one operation per line, written like the arguments
//! of an `ip` subcommand:
//!
//! ```text
//! # bridge with one port
//! link add bridge br0
//! link add ethernet eth0 --up
//! link set eth0 --master br0
//! link set br0 --up
//! addr add 192.168.1.1/24 --dev br0
//! route add 192.168.1.0/24 --dev br0
//! route add default --via 192.168.1.254 --dev br0
//! ```
//!
//! Every change notification the backend emits is printed, followed by the
//! final cache contents.

mod commands;
mod output;

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use netplat::{FakePlatform, Platform};

use output::{OutputFormat, Report};

#[derive(Parser)]
#[command(
    name = "platsim",
    version,
    about = "Replay platform operations against the in-memory backend"
)]
struct Cli {
    /// Script file ("-" or omitted for stdin).
    script: Option<PathBuf>,

    /// Output JSON.
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long)]
    pretty: bool,

    /// Only print the final cache contents.
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Report failing lines and continue.
    #[arg(short = 'k', long)]
    keep_going: bool,
}

fn read_script(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display())),
        _ => {
            let mut script = String::new();
            std::io::stdin()
                .read_to_string(&mut script)
                .context("cannot read stdin")?;
            Ok(script)
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let script = read_script(cli.script.as_ref())?;

    let mut platform = FakePlatform::new();
    let mut changes = platform.subscribe();
    let mut report = Report::new(format, cli.quiet);

    for (index, line) in script.lines().enumerate() {
        let lineno = index + 1;
        let Some(step) = commands::parse_line(line).with_context(|| format!("line {}", lineno))?
        else {
            continue;
        };

        let result = step.run(&mut platform);
        report.record(lineno, line.trim(), changes.drain());

        match result {
            Ok(Some(value)) => report.value(lineno, value),
            Ok(None) => {}
            Err(err) if cli.keep_going => {
                tracing::warn!(lineno, "step failed: {:#}", err);
                report.failure(lineno, format!("{:#}", err));
            }
            Err(err) => {
                report.finish(&platform, cli.pretty)?;
                return Err(err.context(format!("line {}", lineno)));
            }
        }
    }

    report.finish(&platform, cli.pretty)
}
