use crate::commands::show::ShowCommand;
use crate::commands::split::SplitCommand;
use clap::{Parser, Subcommand};

pub mod show;
pub mod split;

/// CLI for splitting single-file CD images into tracks using their CUE sheet.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Split(SplitCommand),
    Show(ShowCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::OutputFormat;
    use crate::split::naming::DEFAULT_TEMPLATE;
    use clap::CommandFactory;
    use std::path::PathBuf;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_split_with_defaults() {
        let cli = Cli::try_parse_from(["cues", "split", "album.cue"]).unwrap();
        let Commands::Split(cmd) = cli.command else {
            panic!("expected split");
        };
        assert_eq!(cmd.input, PathBuf::from("album.cue"));
        assert_eq!(cmd.template, DEFAULT_TEMPLATE);
        assert_eq!(cmd.format, OutputFormat::Flac);
        assert_eq!(cmd.jobs, None);
        assert!(!cmd.include_pregap && !cmd.force && !cmd.dry_run);
    }

    #[test]
    fn parses_split_flags() {
        let cli = Cli::try_parse_from([
            "cues",
            "split",
            "rips",
            "-o",
            "out",
            "-F",
            "wav",
            "--include-pregap",
            "-j",
            "3",
            "-f",
            "--dry-run",
        ])
        .unwrap();
        let Commands::Split(cmd) = cli.command else {
            panic!("expected split");
        };
        assert_eq!(cmd.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cmd.format, OutputFormat::Wav);
        assert_eq!(cmd.jobs, Some(3));
        assert!(cmd.include_pregap && cmd.force && cmd.dry_run);
    }

    #[test]
    fn rejects_zero_jobs() {
        assert!(Cli::try_parse_from(["cues", "split", "a.cue", "-j", "0"]).is_err());
    }
}
