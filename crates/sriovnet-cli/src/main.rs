//! sriovnet CLI entry point.
//!
//! Usage:
//!   sriovnet net-devices 0000:02:00.0   # interfaces of a PCI function
//!   sriovnet pf 0000:02:00.6            # physical function of a VF
//!   sriovnet --json vfs 0000:02:00.0    # VFs of a PF, as JSON

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use sriovnet::{OsFs, SriovResolver};
use sriovnet_cli::config::{CliConfig, SYSFS_ROOT_ENV};
use sriovnet_cli::{Command, execute, help_text, parse_args};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();
    let invocation = parse_args(&args)?;

    match invocation.command {
        Command::Help => {
            print!("{}", help_text());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Version => {
            println!("sriovnet {}", env!("CARGO_PKG_VERSION"));
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let config = match &invocation.config_path {
        Some(path) => CliConfig::load_from(path)?,
        None => CliConfig::load()?,
    };
    let layout = config.layout(env::var_os(SYSFS_ROOT_ENV).map(PathBuf::from));
    tracing::debug!(?layout, "resolving against sysfs");

    let resolver = SriovResolver::new(Arc::new(OsFs::new()), layout);
    let answer = execute(&resolver, &invocation.command)?;
    println!("{}", answer.render(invocation.json)?);
    Ok(ExitCode::SUCCESS)
}
