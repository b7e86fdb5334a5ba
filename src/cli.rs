// src/cli.rs

//! CLI argument parsing using `clap`.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `rube`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rube",
    version,
    about = "Build the artifacts declared in a Rubefile, running independent commands in parallel.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to build. With none given, the available tasks are listed.
    #[arg(value_name = "TASK")]
    pub targets: Vec<String>,

    /// Path to the manifest.
    ///
    /// Default: the nearest `Rubefile`, `Rubefile.json` or `Rubefile.toml`
    /// in the current directory or one of its parents.
    #[arg(short = 'f', long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Maximum number of commands running at once.
    #[arg(short, long, value_name = "N", default_value = "2")]
    pub parallel: NonZeroUsize,

    /// Keep running and rebuild when source files change.
    #[arg(short, long)]
    pub watch: bool,

    /// Print the commands that would run, in dependency order, without
    /// running them.
    #[arg(short, long)]
    pub dry_run: bool,

    /// Log every command that succeeds, not only failures.
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUBE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["rube", "all"]).unwrap();
        assert_eq!(args.targets, vec!["all"]);
        assert_eq!(args.parallel.get(), 2);
        assert!(!args.watch && !args.dry_run && !args.verbose);
        assert!(args.manifest.is_none());
    }

    #[test]
    fn flags_and_multiple_targets() {
        let args = CliArgs::try_parse_from([
            "rube", "-p", "8", "-w", "--log-level", "debug", "-f", "build/Rubefile", "a", "b",
        ])
        .unwrap();
        assert_eq!(args.parallel.get(), 8);
        assert!(args.watch);
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert_eq!(args.manifest, Some(PathBuf::from("build/Rubefile")));
        assert_eq!(args.targets, vec!["a", "b"]);
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        assert!(CliArgs::try_parse_from(["rube", "-p", "0", "all"]).is_err());
    }
}
