//! Clap derive structures for the `kampus` CLI.
//!
//! Defines the command tree, global flags, and shared argument types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// kampus -- admin CLI for school website content
#[derive(Debug, Parser)]
#[command(
    name = "kampus",
    version,
    about = "Manage school website content from the command line",
    long_about = "Lists, creates, updates and deletes the content behind a school website:\n\
        news, gallery, achievements, documents, students, teachers, academic\n\
        sections, page sections and videos. Every write re-reads the collection,\n\
        so what is printed afterwards is what the service stored.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Service profile to use
    #[arg(long, short = 'p', env = "KAMPUS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Service URL (overrides profile)
    #[arg(long, short = 'u', env = "KAMPUS_URL", global = true)]
    pub url: Option<String>,

    /// Service API key
    #[arg(long, env = "KAMPUS_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "KAMPUS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "KAMPUS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one key per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage news articles
    #[command(alias = "n")]
    News(NewsArgs),

    /// Manage gallery images
    #[command(alias = "g")]
    Gallery(EntityArgs),

    /// Manage student and teacher achievements
    #[command(alias = "ach")]
    Achievements(EntityArgs),

    /// Manage downloadable documents
    #[command(alias = "docs")]
    Documents(EntityArgs),

    /// Manage the student roster
    Students(EntityArgs),

    /// Manage the staff directory
    #[command(alias = "staff")]
    Teachers(EntityArgs),

    /// Manage academic sections (curriculum, schedule, calendar, ...)
    Academic(EntityArgs),

    /// Manage keyed page content sections
    Sections(SectionsArgs),

    /// Manage embedded videos
    Videos(EntityArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared entity commands ───────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EntityArgs {
    #[command(subcommand)]
    pub command: EntityCommand,
}

/// Operations every content kind supports.
#[derive(Debug, Subcommand)]
pub enum EntityCommand {
    /// List records
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one record
    Get {
        /// Record key (id, or section key for sections)
        key: String,
    },

    /// Create a record
    Add(PayloadArgs),

    /// Update fields of a record (omitted fields are left alone)
    Update {
        /// Record key (id, or section key for sections)
        key: String,

        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        /// Record key (id, or section key for sections)
        key: String,

        /// Also remove the uploaded files the record points at
        #[arg(long)]
        purge_blob: bool,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Field filter as COLUMN=VALUE (repeatable)
    #[arg(long, short = 'f', value_name = "COLUMN=VALUE")]
    pub filter: Vec<String>,

    /// Only records in this category (class, for students)
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Only records of this type (file type for documents, student or
    /// teacher for achievements)
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub kind: Option<String>,

    /// Case-insensitive text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Show at most this many records
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

/// Record fields as a JSON object, inline or from a file.
#[derive(Debug, Args)]
pub struct PayloadArgs {
    /// JSON object with the record fields
    #[arg(long, short = 'd', required_unless_present = "from_file", conflicts_with = "from_file")]
    pub data: Option<String>,

    /// Read the JSON object from a file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

// ── News ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NewsArgs {
    #[command(subcommand)]
    pub command: NewsCommand,
}

#[derive(Debug, Subcommand)]
pub enum NewsCommand {
    #[command(flatten)]
    Entity(EntityCommand),

    /// List published articles only
    Published(ListArgs),

    /// Record one detail-page view of an article
    View {
        /// Article id
        id: String,
    },
}

// ── Sections ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SectionsArgs {
    #[command(subcommand)]
    pub command: SectionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SectionsCommand {
    #[command(flatten)]
    Entity(EntityCommand),

    /// Create or overwrite the content of a section
    Set {
        /// Section key (e.g. "visi-misi")
        key: String,

        /// New section content
        #[arg(long)]
        content: String,

        /// Section title (required when the section does not exist yet)
        #[arg(long)]
        title: Option<String>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a profile with guided setup
    Init,

    /// Display current resolved configuration (secrets masked)
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (url, bucket, api_key_env, timeout, fetch_ordering, ...)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the active profile's API key in the system keyring
    SetKey,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
