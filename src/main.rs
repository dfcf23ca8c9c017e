use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cfg = ki_player::config::Config::parse();
    if cfg.list_devices {
        ki_player::audio::list_input_devices()?;
        return Ok(());
    }

    ki_player::logging::init_file(cfg.log_file.as_deref(), cfg.log_level)?;
    ki_player::app::run(cfg)
}
