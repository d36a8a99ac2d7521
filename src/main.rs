use crate::commands::{Cli, Commands};
use crate::planner::PlanOptions;
use crate::split::{show_cue_file, split_input};
use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::debug;

mod audio;
mod cd;
mod commands;
mod cue;
mod planner;
mod split;
mod util;

pub mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let logger = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .build();

    let level = logger.filter();
    let pb = MultiProgress::new();

    LogWrapper::new(pb.clone(), logger).try_init()?;
    log::set_max_level(level);

    debug!(
        "{} {} ({}, {})",
        built_info::PKG_NAME,
        built_info::PKG_VERSION,
        built_info::TARGET,
        built_info::PROFILE
    );

    let cli = Cli::parse();

    match cli.command {
        Commands::Split(cmd) => {
            split_input(pb.clone(), &cmd.input, &cmd.options()).await?;
        }
        Commands::Show(cmd) => {
            let options = PlanOptions {
                include_pregap: cmd.include_pregap,
            };
            println!("{}", show_cue_file(&cmd.input_cue, options).await?);
        }
    }

    Ok(())
}
