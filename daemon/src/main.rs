//! dwmstatus: publishes a compact system status line as the X root window
//! name, where dwm shows it in its bar.

mod cadence;
mod daemon;
mod status;

use anyhow::{Context, Result};
use clap::Parser;
use daemon::{Samplers, StatusDaemon};
use dwmstatus_rs_core::command::SystemCommand;
use dwmstatus_rs_core::StatusConfig;
use dwmstatus_rs_display::RootWindow;
use std::convert::Infallible;
use std::process;

#[derive(Parser)]
#[command(
    name = "dwmstatus",
    about = "Status line publisher for dwm",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Args {
    /// Any value echoes every published line and its bytes to stdout
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    debug: Vec<String>,
}

async fn run(args: Args) -> Result<Infallible> {
    let config = StatusConfig::load().context("Could not load configuration")?;
    match StatusConfig::find_config_file() {
        Some(path) => log::info!("dwmstatus: using config {}", path.display()),
        None => log::info!("dwmstatus: using built-in defaults"),
    }

    let window = RootWindow::open()?;
    let samplers = Samplers::from_config(&config, SystemCommand);
    let daemon = StatusDaemon::new(&config, samplers, window, !args.debug.is_empty());

    Ok(daemon.run().await?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(args).await {
        Ok(never) => match never {},
        Err(e) => {
            log::error!("{:#}", e);
            process::exit(1);
        }
    }
}
