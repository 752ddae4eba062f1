//! echodwmstatus: prints the status line dwm is currently showing.
//!
//! Exits with 1 if the display cannot be opened, 2 if the root window name
//! cannot be fetched and 3 if the root window has no name.

use clap::Parser;
use dwmstatus_rs_display::read_root_title;
use std::io::{self, Write};
use std::process;

#[derive(Parser)]
#[command(
    name = "echodwmstatus",
    about = "Print the root window name",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Args {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    _ignored: Vec<String>,
}

fn main() {
    let _args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let title = match read_root_title() {
        Ok(title) => title,
        Err(e) => {
            log::error!("{}", e);
            process::exit(e.exit_code());
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(&title).and_then(|()| stdout.write_all(b"\n")) {
        log::error!("Could not write to stdout: {}", e);
        process::exit(1);
    }
}
