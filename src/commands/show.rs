use clap::Parser;
use std::path::PathBuf;

/// Prints the parsed CUE sheet and the resulting track plan.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct ShowCommand {
    /// The .cue file to inspect
    #[arg(value_name = "CUE")]
    pub input_cue: PathBuf,

    /// Start tracks at INDEX 00 so the pre-gap belongs to the following track
    #[arg(long, default_value_t = false)]
    pub include_pregap: bool,
}
