//! # Tote Catalog CLI (`totes`)
//!
//! ## Usage
//!
//! ```bash
//! totes --config ./config/totes.toml [--user <name>] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `totes init` | Create the SQLite database and run schema migrations |
//! | `totes tote add\|list\|show\|delete\|move-room\|rename` | Manage totes |
//! | `totes item add\|edit\|delete\|move` | Manage items inside totes |
//! | `totes room add\|list\|update\|delete` | Manage rooms |
//! | `totes search "<query>"` | Typo-tolerant search, grouped by tote |
//! | `totes history show\|clear` | Recent searches |
//! | `totes backup create\|list\|restore` | Rolling snapshots |
//! | `totes export` / `totes import <file>` | JSON export and merge-import |
//! | `totes stats` | Counts per room and top tags |
//! | `totes draft show\|save\|clear` | In-progress tote capture |
//!
//! Every command that touches the catalog loads it first, which migrates
//! old records and takes the daily automatic backup when one is due.

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use tote_catalog::{
    backup_cmd, config, draft_cmd, export, logging, migrate, room_cmd, search, stats, tote_cmd,
};

/// Tote Catalog CLI: a local-first inventory of storage totes.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file and a `--user` flag selecting whose catalog to use.
#[derive(Parser)]
#[command(
    name = "totes",
    about = "Tote Catalog: a local-first inventory of storage totes, rooms, and items",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/totes.toml")]
    config: PathBuf,

    /// Catalog namespace to use. Overrides `catalog.user` from the config.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Increase log verbosity (-v info, -vv debug). `TOTES_LOG` wins if set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Create, list, and edit totes.
    Tote {
        #[command(subcommand)]
        action: ToteAction,
    },

    /// Add, edit, delete, and move items.
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },

    /// Manage rooms.
    Room {
        #[command(subcommand)]
        action: RoomAction,
    },

    /// Search descriptions, tags, labels, and rooms. Typos are tolerated.
    Search {
        /// The search query string.
        query: String,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show or clear recent searches.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Create, list, and restore backups.
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Export totes and rooms as JSON.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Merge an exported JSON file into the catalog.
    Import {
        /// Path to the export file.
        file: PathBuf,
    },

    /// Show catalog statistics.
    Stats,

    /// Inspect or manage the in-progress tote draft.
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },

    /// Print a shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ToteAction {
    /// Add a tote with at least one item.
    Add {
        #[arg(long)]
        label: String,

        #[arg(long)]
        room: String,

        /// An item as `description|tag, tag`. Repeat for more items.
        #[arg(long = "item", required = true)]
        items: Vec<String>,

        #[arg(long)]
        image_url: Option<String>,
    },

    /// List totes, optionally only those in one room.
    List {
        #[arg(long)]
        room: Option<String>,
    },

    /// Show one tote and its items.
    Show { id: i64 },

    Delete { id: i64 },

    /// Move a tote to another room.
    MoveRoom { id: i64, room: String },

    Rename { id: i64, label: String },
}

#[derive(Subcommand)]
enum ItemAction {
    /// Append an item to a tote.
    Add {
        tote: i64,
        description: String,

        /// Comma-separated tags.
        #[arg(long, default_value = "")]
        tags: String,
    },

    /// Replace an item's description and tags.
    Edit {
        tote: i64,
        index: usize,
        description: String,

        /// Comma-separated tags.
        #[arg(long, default_value = "")]
        tags: String,
    },

    /// Delete items given as `TOTE_ID:INDEX`. A tote left empty is deleted.
    Delete {
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Move an item to the end of another tote.
    Move { from: i64, index: usize, to: i64 },
}

#[derive(Subcommand)]
enum RoomAction {
    Add {
        name: String,

        #[arg(long)]
        icon: Option<String>,
    },

    List,

    /// Rename a room (totes follow) and/or change its icon.
    Update {
        name: String,

        #[arg(long)]
        rename: Option<String>,

        #[arg(long)]
        icon: Option<String>,
    },

    /// Delete a room that no tote uses.
    Delete { name: String },
}

#[derive(Subcommand)]
enum HistoryAction {
    Show,
    Clear,
}

#[derive(Subcommand)]
enum BackupAction {
    Create,
    List,

    /// Replace the current catalog with a backup.
    Restore {
        timestamp: String,

        /// Confirm that current totes and rooms will be replaced.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum DraftAction {
    Show,

    /// Store a JSON draft.
    Save { json: String },

    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "totes", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    let user = cli.user.as_deref();

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Tote { action } => match action {
            ToteAction::Add {
                label,
                room,
                items,
                image_url,
            } => {
                tote_cmd::run_tote_add(&cfg, user, &label, &room, &items, image_url).await?;
            }
            ToteAction::List { room } => {
                tote_cmd::run_tote_list(&cfg, user, room.as_deref()).await?;
            }
            ToteAction::Show { id } => tote_cmd::run_tote_show(&cfg, user, id).await?,
            ToteAction::Delete { id } => tote_cmd::run_tote_delete(&cfg, user, id).await?,
            ToteAction::MoveRoom { id, room } => {
                tote_cmd::run_tote_move_room(&cfg, user, id, &room).await?;
            }
            ToteAction::Rename { id, label } => {
                tote_cmd::run_tote_rename(&cfg, user, id, &label).await?;
            }
        },
        Commands::Item { action } => match action {
            ItemAction::Add {
                tote,
                description,
                tags,
            } => {
                tote_cmd::run_item_add(&cfg, user, tote, &description, &tags).await?;
            }
            ItemAction::Edit {
                tote,
                index,
                description,
                tags,
            } => {
                tote_cmd::run_item_edit(&cfg, user, tote, index, &description, &tags).await?;
            }
            ItemAction::Delete { items } => {
                tote_cmd::run_item_delete(&cfg, user, &items).await?;
            }
            ItemAction::Move { from, index, to } => {
                tote_cmd::run_item_move(&cfg, user, from, index, to).await?;
            }
        },
        Commands::Room { action } => match action {
            RoomAction::Add { name, icon } => {
                room_cmd::run_room_add(&cfg, user, &name, icon.as_deref()).await?;
            }
            RoomAction::List => room_cmd::run_room_list(&cfg, user).await?,
            RoomAction::Update { name, rename, icon } => {
                room_cmd::run_room_update(&cfg, user, &name, rename.as_deref(), icon.as_deref())
                    .await?;
            }
            RoomAction::Delete { name } => room_cmd::run_room_delete(&cfg, user, &name).await?,
        },
        Commands::Search { query, json } => {
            search::run_search(&cfg, user, &query, json).await?;
        }
        Commands::History { action } => match action {
            HistoryAction::Show => search::run_history_show(&cfg, user).await?,
            HistoryAction::Clear => search::run_history_clear(&cfg, user).await?,
        },
        Commands::Backup { action } => match action {
            BackupAction::Create => backup_cmd::run_backup_create(&cfg, user).await?,
            BackupAction::List => backup_cmd::run_backup_list(&cfg, user).await?,
            BackupAction::Restore { timestamp, yes } => {
                backup_cmd::run_backup_restore(&cfg, user, &timestamp, yes).await?;
            }
        },
        Commands::Export { output } => {
            export::run_export(&cfg, user, output.as_deref()).await?;
        }
        Commands::Import { file } => {
            export::run_import(&cfg, user, &file).await?;
        }
        Commands::Stats => stats::run_stats(&cfg, user).await?,
        Commands::Draft { action } => match action {
            DraftAction::Show => draft_cmd::run_draft_show(&cfg, user).await?,
            DraftAction::Save { json } => draft_cmd::run_draft_save(&cfg, user, &json).await?,
            DraftAction::Clear => draft_cmd::run_draft_clear(&cfg, user).await?,
        },
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
