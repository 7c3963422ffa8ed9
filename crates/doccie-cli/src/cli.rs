// SPDX-License-Identifier: Apache-2.0

//! Command-line interface definition for Doccie.
//!
//! Uses clap's derive API for declarative CLI parsing with hierarchical
//! noun-verb subcommands for autocomplete-optimal design.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use doccie_core::{ExportFormat, RepoSelector, RepoStatus};

/// Extended help text for the generate subcommand with shell-specific examples.
const COMPLETION_GENERATE_HELP: &str = r#"EXAMPLES

  bash
    Add to ~/.bashrc or ~/.bash_profile:
      eval "$(doccie completion generate bash)"

  zsh
    Generate completion file:
      mkdir -p ~/.zsh/completions
      doccie completion generate zsh > ~/.zsh/completions/_doccie

    Add to ~/.zshrc (before compinit):
      fpath=(~/.zsh/completions $fpath)
      autoload -U compinit && compinit -i

  fish
    Generate completion file:
      doccie completion generate fish > ~/.config/fish/completions/doccie.fish

  PowerShell
    Add to $PROFILE:
      doccie completion generate powershell | Out-String | Invoke-Expression
"#;

/// Output format for CLI results.
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with colors (default)
    #[default]
    Text,
    /// JSON output for programmatic consumption
    Json,
    /// YAML output for programmatic consumption
    Yaml,
    /// Markdown output for READMEs and issue comments
    Markdown,
}

/// Global output configuration passed to commands.
#[derive(Clone)]
pub struct OutputContext {
    /// Output format (text, json, yaml, markdown)
    pub format: OutputFormat,
    /// Suppress non-essential output (spinners, success notices)
    pub quiet: bool,
    /// Enable verbose output
    pub verbose: bool,
    /// Whether stdout is a terminal (TTY)
    pub is_tty: bool,
}

impl OutputContext {
    /// Creates an `OutputContext` from CLI arguments.
    pub fn from_cli(format: OutputFormat, quiet: bool, verbose: bool) -> Self {
        Self {
            format,
            quiet,
            verbose,
            is_tty: std::io::stdout().is_terminal(),
        }
    }

    /// Returns true if interactive elements (spinners, prompts) should be shown.
    pub fn is_interactive(&self) -> bool {
        self.is_tty && !self.quiet && matches!(self.format, OutputFormat::Text)
    }
}

/// Monitoring status accepted by `--status`.
#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    /// Repositories with a webhook installed
    Active,
    /// Repositories not monitored yet
    Inactive,
}

impl From<StatusArg> for RepoStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => RepoStatus::Active,
            StatusArg::Inactive => RepoStatus::Inactive,
        }
    }
}

/// File format accepted by `docs export --format`.
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum ExportFormatArg {
    /// OpenAPI as YAML (default)
    #[default]
    Yaml,
    /// OpenAPI as pretty-printed JSON
    Json,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Yaml => ExportFormat::Yaml,
            ExportFormatArg::Json => ExportFormat::Json,
        }
    }
}

/// Doccie - AI-generated API documentation for your GitHub repositories.
///
/// Sign in with GitHub, pick the repositories Doccie should monitor, and
/// fetch the OpenAPI documentation generated for their backends.
#[derive(Parser)]
#[command(name = "doccie")]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Output format (text, json, yaml, markdown)
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    pub output: OutputFormat,

    /// Suppress non-essential output (spinners, success notices)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (info-level logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Override the configured backend URL (e.g., http://localhost:8000)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with GitHub and manage the stored session
    #[command(subcommand)]
    Auth(AuthCommand),

    /// List repositories and manage monitoring
    #[command(subcommand)]
    Repo(RepoCommand),

    /// Fetch generated API documentation
    #[command(subcommand)]
    Docs(DocsCommand),

    /// Generate shell completion scripts
    #[command(subcommand)]
    Completion(CompletionCommand),
}

/// Authentication subcommands
#[derive(Subcommand)]
pub enum AuthCommand {
    /// Sign in with GitHub via the browser
    Login {
        /// Authorization code to exchange instead of waiting for the browser
        #[arg(long)]
        code: Option<String>,

        /// Print the authorization URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Remove the stored session
    Logout,

    /// Show the stored session
    Status,
}

/// Repository subcommands
#[derive(Subcommand)]
pub enum RepoCommand {
    /// List your repositories
    List {
        /// Case-insensitive substring of the repository name
        #[arg(long, short = 's')]
        search: Option<String>,

        /// Only show repositories with this status (repeatable)
        #[arg(long, value_enum)]
        status: Vec<StatusArg>,
    },

    /// Show repository details and its directory tree
    Show {
        /// Repository id or owner/name
        repo: RepoSelector,
    },

    /// Start monitoring a repository (installs the webhook)
    Activate {
        /// Repository id or owner/name
        repo: RepoSelector,

        /// Directory holding the backend code (e.g., "api" or "services/backend")
        #[arg(long)]
        backend_path: String,
    },

    /// Stop monitoring a repository (removes the webhook)
    Deactivate {
        /// Repository id or owner/name
        repo: RepoSelector,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Documentation subcommands
#[derive(Subcommand)]
pub enum DocsCommand {
    /// Summarize the generated OpenAPI document
    Show {
        /// Repository id or owner/name
        repo: RepoSelector,
    },

    /// Write the OpenAPI document to a file
    Export {
        /// Repository id or owner/name
        repo: RepoSelector,

        /// File format
        #[arg(long, short = 'f', value_enum, default_value = "yaml")]
        format: ExportFormatArg,

        /// Destination file (defaults to api-documentation.<ext>)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write the Mermaid dependency diagram to a file
    Diagram {
        /// Repository id or owner/name
        repo: RepoSelector,

        /// Destination file (defaults to dependency.mmd)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Completion subcommands
#[derive(Subcommand)]
pub enum CompletionCommand {
    /// Generate completion script for a shell (output to stdout)
    #[command(after_long_help = COMPLETION_GENERATE_HELP)]
    Generate {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
