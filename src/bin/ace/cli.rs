//! CLI definitions using clap.

use std::path::PathBuf;

use ace::core::platform::{FileType, Platform};
use clap::{Args, Parser, Subcommand};

/// ace - native library packaging for ArkUI-X
#[derive(Parser)]
#[command(name = "ace")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy the native libraries a project uses into its native projects
    Build(BuildArgs),

    /// Publish the SDK frameworks as a CocoaPod and reference it from the Podfile
    Pods(PodsArgs),

    /// Show the modules a project resolves to
    Deps(DepsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Project and SDK selection shared by every packaging command.
#[derive(Args)]
pub struct LocationArgs {
    /// ArkUI-X project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// ArkUI-X SDK root, or a directory holding `<api>/arkui-x`
    #[arg(long, value_name = "DIR", env = "ARKUIX_SDK_PATH")]
    pub sdk: Option<PathBuf>,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Output file type (apk, aar, ios, ios-framework, ios-xcframework)
    #[arg(value_parser = parse_file_type)]
    pub file_type: FileType,

    #[command(flatten)]
    pub location: LocationArgs,

    /// Package debug libraries
    #[arg(long, conflicts_with = "profile")]
    pub debug: bool,

    /// Package profile libraries
    #[arg(long)]
    pub profile: bool,

    /// Build for the iOS simulator
    #[arg(long)]
    pub simulator: bool,

    /// Android targets when build.gradle has no abiFilters (e.g. arm64,arm,x86_64)
    #[arg(long, value_name = "LIST")]
    pub target_platform: Option<String>,

    /// Remove libraries the project no longer uses
    #[arg(long)]
    pub clear_lib: bool,

    /// Do not ship ICU data
    #[arg(long)]
    pub no_icu: bool,

    /// Print what would change without touching the project
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct PodsArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Do not ship ICU data
    #[arg(long)]
    pub no_icu: bool,
}

#[derive(Args)]
pub struct DepsArgs {
    /// Platform to resolve for (android, ios)
    #[arg(value_parser = parse_platform)]
    pub platform: Platform,

    #[command(flatten)]
    pub location: LocationArgs,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

fn parse_file_type(s: &str) -> Result<FileType, String> {
    s.parse()
}

fn parse_platform(s: &str) -> Result<Platform, String> {
    s.parse()
}
