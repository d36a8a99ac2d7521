use crate::audio::OutputFormat;
use crate::planner::PlanOptions;
use crate::split::SplitOptions;
use crate::split::naming::DEFAULT_TEMPLATE;
use clap::Parser;
use std::path::PathBuf;
use std::thread;

/// Splits a CD image into one file per track using its CUE sheet.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct SplitCommand {
    /// A .cue file, or a directory searched recursively for .cue files
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory for the tracks, defaults to the directory of each .cue file
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// File name template using {track}, {track:N}, {title}, {performer} and {album}
    #[arg(long, short = 't', value_name = "TEMPLATE", default_value = DEFAULT_TEMPLATE)]
    pub template: String,

    /// Output audio format
    #[arg(long, short = 'F', value_enum, default_value_t = OutputFormat::Flac)]
    pub format: OutputFormat,

    /// Start tracks at INDEX 00 so the pre-gap belongs to the following track
    #[arg(long, default_value_t = false)]
    pub include_pregap: bool,

    /// Number of tracks extracted concurrently, defaults to the available parallelism
    #[arg(long, short = 'j', value_name = "JOBS", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Force overwrite of existing track files
    #[arg(long, short = 'f', default_value_t = false)]
    pub force: bool,

    /// Only print the planned tracks and file names
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

impl SplitCommand {
    pub fn options(&self) -> SplitOptions {
        let jobs = self
            .jobs
            .map(usize::from)
            .or_else(|| thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1);

        SplitOptions {
            output_dir: self.output_dir.clone(),
            template: self.template.clone(),
            format: self.format,
            plan: PlanOptions {
                include_pregap: self.include_pregap,
            },
            jobs,
            force: self.force,
            dry_run: self.dry_run,
        }
    }
}
