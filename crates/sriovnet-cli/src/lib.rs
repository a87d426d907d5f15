//! sriovnet command line.
//!
//! A thin layer over [`sriovnet::SriovResolver`]: parse arguments, run one
//! lookup, print the answer as lines or JSON.

pub mod config;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use sriovnet::SriovResolver;

/// A single lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Network interfaces of a PCI function.
    NetDevices(String),
    /// Physical function of a VF.
    Pf(String),
    /// VFs of a physical function.
    Vfs(String),
    /// Index of a VF under its PF.
    VfIndex(String),
    /// PCI address behind an interface.
    Pci(String),
    Help,
    Version,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub config_path: Option<PathBuf>,
    pub json: bool,
    pub command: Command,
}

/// Result of a lookup, ready to print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Names(Vec<String>),
    Name(String),
    Index(u32),
}

impl Answer {
    /// Render as plain lines or a JSON value.
    pub fn render(&self, json: bool) -> Result<String> {
        if json {
            return serde_json::to_string(self).context("Failed to encode JSON");
        }
        Ok(match self {
            Answer::Names(names) => names.join("\n"),
            Answer::Name(name) => name.clone(),
            Answer::Index(index) => index.to_string(),
        })
    }
}

/// Parse arguments, excluding the program name.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut config_path = None;
    let mut json = false;
    let mut rest = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--config" => {
                let path = iter.next().context("--config requires a path")?;
                config_path = Some(PathBuf::from(path));
            }
            s if s.starts_with("--config=") => {
                config_path = Some(PathBuf::from(&s["--config=".len()..]));
            }
            "-h" | "--help" => {
                return Ok(Invocation { config_path, json, command: Command::Help });
            }
            "-V" | "--version" => {
                return Ok(Invocation { config_path, json, command: Command::Version });
            }
            s if s.starts_with('-') => bail!("Unknown option: {s}"),
            _ => rest.push(arg.as_str()),
        }
    }

    let command = match rest.as_slice() {
        [] => Command::Help,
        ["net-devices", pci] => Command::NetDevices(pci.to_string()),
        ["pf", vf] => Command::Pf(vf.to_string()),
        ["vfs", pf] => Command::Vfs(pf.to_string()),
        ["vf-index", vf] => Command::VfIndex(vf.to_string()),
        ["pci", netdev] => Command::Pci(netdev.to_string()),
        [cmd @ ("net-devices" | "pf" | "vfs" | "vf-index" | "pci")] => {
            bail!("{cmd} requires one argument")
        }
        [cmd, ..] => bail!("Unknown command: {cmd}"),
    };

    Ok(Invocation { config_path, json, command })
}

/// Run a lookup command. `Help` and `Version` are handled by the caller.
pub fn execute(resolver: &SriovResolver, command: &Command) -> Result<Answer> {
    let answer = match command {
        Command::NetDevices(pci) => Answer::Names(resolver.net_devices_from_pci(pci)?),
        Command::Pf(vf) => Answer::Name(resolver.pf_pci_from_vf_pci(vf)?),
        Command::Vfs(pf) => Answer::Names(resolver.vf_pci_addresses(pf)?),
        Command::VfIndex(vf) => Answer::Index(resolver.vf_index_from_vf_pci(vf)?),
        Command::Pci(netdev) => Answer::Name(resolver.pci_from_net_device(netdev)?),
        Command::Help | Command::Version => bail!("{command:?} is not a lookup"),
    };
    Ok(answer)
}

pub fn help_text() -> String {
    format!(
        r#"sriovnet v{}

Usage:
  sriovnet [OPTIONS] <command> <arg>

Commands:
  net-devices <pci>            Network interfaces of a PCI function
  pf <vf-pci>                  Physical function of a virtual function
  vfs <pf-pci>                 Virtual functions of a physical function
  vf-index <vf-pci>            Index of a VF under its physical function
  pci <netdev>                 PCI address behind a network interface

Options:
  --config=<path>              Config file (default: ~/.config/sriovnet/config.toml)
  --json                       Print the answer as JSON
  -h, --help                   Show this help
  -V, --version                Show version

Environment:
  SRIOVNET_SYSFS_ROOT          Where sysfs is mounted (default: /sys)
  RUST_LOG                     Log filter, e.g. sriovnet=debug
"#,
        env!("CARGO_PKG_VERSION")
    )
}
