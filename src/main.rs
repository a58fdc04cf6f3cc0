mod cli;
mod command;
mod config;
mod distro;
mod error;
mod exec;
mod manager;
mod select;
mod store;
mod sync;

use anyhow::Result;

fn main() -> Result<()> {
    cli::run()
}
