//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "rapidkit",
    bin_name = "rapidkit",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{26a1} Compose service projects from kits and modules",
    long_about = "RapidKit builds runnable service projects from a catalog of kits \
                  (profile chains plus module selections) and modules \
                  (templates, snippets and dependencies).",
    after_help = "EXAMPLES:\n\
        \x20 rapidkit create order-service --kit fastapi/standard\n\
        \x20 rapidkit create api --kit fastapi/ddd --var author=\"Jane\" --dry-run\n\
        \x20 rapidkit add logging --variant fastapi --project ./api\n\
        \x20 rapidkit list --modules\n\
        \x20 rapidkit completions bash > /usr/share/bash-completion/completions/rapidkit",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Whether the selected subcommand asks for debug logging.
    pub fn wants_debug(&self) -> bool {
        matches!(&self.command, Commands::Create(args) if args.debug)
    }
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new project from a kit.
    #[command(
        visible_alias = "new",
        about = "Create a new project from a kit",
        after_help = "EXAMPLES:\n\
            \x20 rapidkit create order-service --kit fastapi/standard\n\
            \x20 rapidkit create svc -k fastapi/ddd -o ./services/svc --var license=Apache-2.0\n\
            \x20 rapidkit create svc -k fastapi/standard --force --debug"
    )]
    Create(CreateArgs),

    /// Generate one module into an existing project.
    #[command(
        about = "Add a module to an existing project",
        after_help = "EXAMPLES:\n\
            \x20 rapidkit add logging --variant fastapi\n\
            \x20 rapidkit add logging --variant fastapi --project ./api --force"
    )]
    Add(AddArgs),

    /// List kits (and modules) in the catalog.
    #[command(
        visible_alias = "ls",
        about = "List available kits",
        after_help = "EXAMPLES:\n\
            \x20 rapidkit list\n\
            \x20 rapidkit list --modules --format json"
    )]
    List(ListArgs),

    /// Show one kit: profile chain, variables and modules.
    #[command(
        about = "Show kit details",
        after_help = "EXAMPLES:\n\
            \x20 rapidkit info fastapi/standard\n\
            \x20 rapidkit info fastapi/ddd --format json"
    )]
    Info(InfoArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 rapidkit completions bash > ~/.local/share/bash-completion/completions/rapidkit\n\
            \x20 rapidkit completions zsh  > ~/.zfunc/_rapidkit\n\
            \x20 rapidkit completions fish > ~/.config/fish/completions/rapidkit.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the effective configuration.
    #[command(
        about = "Configuration inspection",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 rapidkit config get catalog.path\n\
            \x20 rapidkit config list\n\
            \x20 rapidkit config path"
    )]
    Config(ConfigCommands),
}

// ── create ────────────────────────────────────────────────────────────────────

/// Arguments for `rapidkit create`.
#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Project name; also the default output directory.
    #[arg(value_name = "NAME", help = "Project name")]
    pub name: String,

    /// Kit to build from. Falls back to `defaults.kit` in the config file.
    #[arg(short = 'k', long = "kit", value_name = "KIT", help = "Kit name")]
    pub kit: Option<String>,

    /// Output directory.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        help = "Output directory (default: ./<NAME>)"
    )]
    pub output: Option<PathBuf>,

    /// Variable values, `KEY=VALUE`, repeatable.
    #[arg(
        long = "var",
        value_name = "KEY=VALUE",
        value_parser = parse_key_val,
        help = "Set a variable (repeatable)"
    )]
    pub vars: Vec<(String, String)>,

    /// Replace a non-empty output directory (destructive).
    #[arg(long = "force", help = "Overwrite the output directory")]
    pub force: bool,

    /// Prompt for missing required variables.
    #[arg(short = 'i', long = "interactive", help = "Prompt for missing variables")]
    pub interactive: bool,

    /// Debug logging plus a dump of every module's render context.
    #[arg(long = "debug", help = "Log render contexts at debug level")]
    pub debug: bool,

    /// Run the whole pipeline in memory and list the files it would write.
    #[arg(long = "dry-run", help = "Show what would be created without creating")]
    pub dry_run: bool,
}

// ── add ───────────────────────────────────────────────────────────────────────

/// Arguments for `rapidkit add`.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Module name (or catalog path).
    #[arg(value_name = "MODULE", help = "Module to add")]
    pub module: String,

    /// Framework variant of the module.
    #[arg(long = "variant", value_name = "VARIANT", help = "Variant to generate")]
    pub variant: String,

    /// Existing project directory.
    #[arg(
        short = 'p',
        long = "project",
        value_name = "DIR",
        default_value = ".",
        help = "Project directory"
    )]
    pub project: PathBuf,

    /// Take variables and ecosystem from this kit.
    #[arg(short = 'k', long = "kit", value_name = "KIT", help = "Kit the project was built from")]
    pub kit: Option<String>,

    #[arg(
        long = "var",
        value_name = "KEY=VALUE",
        value_parser = parse_key_val,
        help = "Set a variable (repeatable)"
    )]
    pub vars: Vec<(String, String)>,

    /// Overwrite existing variant files.
    #[arg(long = "force", help = "Overwrite existing module files")]
    pub force: bool,

    #[arg(short = 'i', long = "interactive", help = "Prompt for missing variables")]
    pub interactive: bool,
}

// ── list / info ───────────────────────────────────────────────────────────────

/// Arguments for `rapidkit list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Also list modules.
    #[arg(short = 'm', long = "modules", help = "Include catalog modules")]
    pub modules: bool,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Arguments for `rapidkit info`.
#[derive(Debug, Args)]
pub struct InfoArgs {
    #[arg(value_name = "KIT", help = "Kit name")]
    pub kit: String,

    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for `list` and `info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One name per line.
    List,
    /// JSON document.
    Json,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `rapidkit completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `rapidkit config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `catalog.path`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

/// Parse `KEY=VALUE`. The value may itself contain `=`.
fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

// ── tests ─────────────────────────────────────────────────────────────────────
