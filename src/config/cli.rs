use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Vitrine binary.
#[derive(Debug, Parser)]
#[command(name = "vitrine", version, about = "Vitrine content editing tools")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "VITRINE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the content storage directory.
    #[arg(
        long = "storage-directory",
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        global = true
    )]
    pub storage_directory: Option<PathBuf>,
}

#[derive(Debug, Subcommand, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the built-in section schemas.
    Sections,
    /// Print the stored (or default) content of a section as JSON.
    Show(ShowArgs),
    /// Validate every stored section against its schema.
    Check,
    /// Set one field of a section and publish it.
    Set(SetArgs),
    /// Remove the preview draft.
    #[command(name = "clear-draft")]
    ClearDraft,
}

#[derive(Debug, Args, Clone, PartialEq, Eq)]
pub struct ShowArgs {
    /// Section id, e.g. `hero`.
    pub section: String,

    /// Print the preview draft instead of the published content.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub draft: bool,
}

#[derive(Debug, Args, Clone, PartialEq, Eq)]
pub struct SetArgs {
    /// Section id, e.g. `hero`.
    pub section: String,

    /// Field id within the section schema.
    pub field: String,

    /// New value. Booleans accept true/false, numeric fields any number.
    pub value: String,
}
