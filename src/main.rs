use anyhow::{Context, Result};
use clap::Parser;

fn main() -> Result<()> {
    let cfg = lissaviz::config::Config::parse();
    lissaviz::logging::init_tui(cfg.log_file.as_deref())
        .with_context(|| format!("open log file {:?}", cfg.log_file))?;
    lissaviz::app::run(cfg)
}
