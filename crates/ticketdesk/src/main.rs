//! CLI entry point for ticketdesk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ticketdesk_app::Config;
use ticketdesk_core::{StatusFilter, TagToken, parse_tag_tokens};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Tag-based ticket tracking.
#[derive(Parser, Debug)]
#[command(name = "ticketdesk", version, about = "ticketdesk: tickets and tags behind a REST API")]
struct Cli {
    /// Configuration file (defaults to ./ticketdesk.toml, then the per-user file).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the API, overriding configuration.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve,

    /// List tickets.
    Ls {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
    },

    /// Create a ticket.
    New {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Tag id to attach (repeatable).
        #[arg(short = 't', long = "tag")]
        tags: Vec<i64>,
    },

    /// Show a ticket as JSON.
    Show { id: i64 },

    /// Update ticket fields.
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        completed: Option<bool>,
    },

    /// Delete a ticket.
    Rm { id: i64 },

    /// Flip a ticket between open and completed.
    Toggle { id: i64 },

    /// Attach tags to a ticket.
    TagAdd {
        id: i64,
        /// Tag id to attach (repeatable).
        #[arg(short = 't', long = "tag", required = true)]
        tags: Vec<i64>,
    },

    /// Detach a tag from a ticket.
    TagRm { id: i64, tag: i64 },

    /// Manage tags.
    Tag {
        #[command(subcommand)]
        cmd: TagCommand,
    },

    /// Apply an action to a selection of listed tickets in one request.
    Batch {
        #[arg(value_enum)]
        action: BatchVerb,
        #[command(flatten)]
        select: SelectArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Subcommand, Debug)]
enum TagCommand {
    /// List tags with ticket counts.
    Ls {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
    },
    /// Create a tag.
    New {
        #[arg(long)]
        name: String,
        /// Colour as `#rrggbb`.
        #[arg(long)]
        color: Option<String>,
    },
    /// Rename or recolour a tag.
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a tag.
    Rm { id: i64 },
}

/// Ticket list filters.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Case-insensitive text in title or description.
    #[arg(long)]
    search: Option<String>,
    /// Tag id or name; tickets with any of them match (repeatable, comma-separated).
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// `all`, `open` or `completed`.
    #[arg(long, default_value = "all")]
    status: StatusFilter,
}

impl FilterArgs {
    fn tag_tokens(&self) -> Vec<TagToken> {
        self.tags.iter().flat_map(|raw| parse_tag_tokens(raw)).collect()
    }
}

/// Which listed tickets a batch applies to. Flags combine in order:
/// `--all`, `--completed`, `--open`, `--id`, then `--invert`.
#[derive(Args, Debug, Default)]
struct SelectArgs {
    /// Select every listed ticket.
    #[arg(long)]
    all: bool,
    /// Select the listed completed tickets.
    #[arg(long, conflicts_with = "open")]
    completed: bool,
    /// Select the listed open tickets.
    #[arg(long)]
    open: bool,
    /// Select a listed ticket by id (repeatable).
    #[arg(long = "id")]
    ids: Vec<i64>,
    /// Invert the selection over the listed tickets.
    #[arg(long)]
    invert: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LsFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BatchVerb {
    /// Mark selected tickets completed.
    Complete,
    /// Mark selected tickets open.
    Reopen,
    /// Delete selected tickets.
    Delete,
}

fn main() -> Result<()> {
    let Cli { config, api_url, cmd } = Cli::parse();
    install_tracing();

    let mut config = Config::load(config.as_deref()).context("failed to load configuration")?;
    if let Some(url) = api_url {
        config.client.api_url = url;
    }
    tokio::runtime::Runtime::new()?.block_on(commands::run(cmd, &config))
}

fn install_tracing() {
    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// `RUST_LOG` directives when set and valid, otherwise INFO.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ls_with_filters() {
        let cli = Cli::parse_from([
            "ticketdesk",
            "ls",
            "--search",
            "login",
            "--tag",
            "bug,3",
            "--status",
            "OPEN",
            "--format",
            "json",
        ]);

        match cli.cmd {
            Command::Ls { filter, format } => {
                assert_eq!(filter.search.as_deref(), Some("login"));
                assert_eq!(filter.status, StatusFilter::Open);
                assert_eq!(filter.tag_tokens().len(), 2);
                assert_eq!(format, LsFormat::Json);
            }
            _ => panic!("expected ls command"),
        }
    }

    #[test]
    fn parse_batch_with_selection_flags() {
        let cli = Cli::parse_from([
            "ticketdesk",
            "--api-url",
            "http://127.0.0.1:9000",
            "batch",
            "delete",
            "--completed",
            "--id",
            "4",
            "--invert",
        ]);

        assert_eq!(cli.api_url.as_deref(), Some("http://127.0.0.1:9000"));
        match cli.cmd {
            Command::Batch { action, select, .. } => {
                assert_eq!(action, BatchVerb::Delete);
                assert!(select.completed && select.invert && !select.all);
                assert_eq!(select.ids, vec![4]);
            }
            _ => panic!("expected batch command"),
        }
    }

    #[test]
    fn completed_and_open_conflict() {
        let parsed = Cli::try_parse_from(["ticketdesk", "batch", "complete", "--completed", "--open"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn invalid_status_is_rejected() {
        assert!(Cli::try_parse_from(["ticketdesk", "ls", "--status", "maybe"]).is_err());
    }

    #[test]
    fn parse_tag_subcommand() {
        let cli = Cli::parse_from(["ticketdesk", "tag", "new", "--name", "bug", "--color", "#ff0000"]);
        match cli.cmd {
            Command::Tag {
                cmd: TagCommand::New { name, color },
            } => {
                assert_eq!(name, "bug");
                assert_eq!(color.as_deref(), Some("#ff0000"));
            }
            _ => panic!("expected tag new command"),
        }
    }

    #[test]
    fn log_filter_honours_directives() {
        use tracing::level_filters::LevelFilter;

        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("ticketdesk=loud")).max_level_hint(), Some(LevelFilter::INFO));
    }
}
