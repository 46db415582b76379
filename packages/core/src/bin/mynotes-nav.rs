//! Navigation Tree Command Line Tool
//!
//! Opens the navigation database, rebuilds the tree (repairing stored
//! inconsistencies on the way) and prints or edits it.
//!
//! # Usage
//!
//! ```bash
//! # Print the tree from the default database (~/.mynotes/database/data.db)
//! cargo run --bin mynotes-nav
//!
//! # Machine-readable output
//! cargo run --bin mynotes-nav -- show --json
//!
//! # Edit
//! cargo run --bin mynotes-nav -- add-group "Work"
//! cargo run --bin mynotes-nav -- add-list "Groceries" --parent <group-id> --index 0
//! cargo run --bin mynotes-nav -- add-list "Errands" --after <list-or-group-id>
//! cargo run --bin mynotes-nav -- move <id> 2 --parent <group-id>
//! ```
//!
//! # Environment Variables
//!
//! - `MYNOTES_DB_PATH`: Database file (overridden by `--db`)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use anyhow::Context;
use clap::{Parser, Subcommand};
use mynotes_core::db::{DatabaseService, LibsqlNavigationStore, DEFAULT_BUSY_TIMEOUT_MS};
use mynotes_core::{NavigationConfig, NavigationId, NavigationNode, NavigationTree, PersistenceSync};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mynotes-nav", about = "Inspect and edit the MyNotes navigation tree")]
struct Args {
    /// Database file to open
    #[arg(long)]
    db: Option<PathBuf>,

    /// Milliseconds to wait on a locked database
    #[arg(long, default_value_t = DEFAULT_BUSY_TIMEOUT_MS)]
    busy_timeout_ms: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tree
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Add a group (defaults to the end of the top level)
    AddGroup {
        title: String,
        #[command(flatten)]
        placement: Placement,
    },
    /// Add a list (defaults to the end of the top level)
    AddList {
        title: String,
        #[command(flatten)]
        placement: Placement,
    },
    /// Change a node's title
    Rename {
        #[arg(value_parser = NavigationId::parse_reference)]
        id: NavigationId,
        title: String,
    },
    /// Move a node to `index` under `--parent` (or the top level)
    Move {
        #[arg(value_parser = NavigationId::parse_reference)]
        id: NavigationId,
        index: usize,
        #[arg(long, value_parser = NavigationId::parse_reference)]
        parent: Option<NavigationId>,
    },
    /// Remove a node and everything below it
    Remove {
        #[arg(value_parser = NavigationId::parse_reference)]
        id: NavigationId,
    },
}

#[derive(clap::Args)]
struct Placement {
    /// Place after this list, or at the end of this group
    #[arg(long, value_parser = NavigationId::parse_reference, conflicts_with_all = ["parent", "index"])]
    after: Option<NavigationId>,

    #[arg(long, value_parser = NavigationId::parse_reference)]
    parent: Option<NavigationId>,

    #[arg(long)]
    index: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = NavigationConfig {
        database_path: args.db,
        busy_timeout_ms: args.busy_timeout_ms,
    };
    config.validate().map_err(anyhow::Error::msg)?;

    let db_path = config
        .resolve_database_path()
        .context("Failed to resolve database path")?;
    tracing::info!("Database: {}", db_path.display());

    let db = Arc::new(DatabaseService::open(db_path, config.busy_timeout_ms).await?);
    let sync = PersistenceSync::new(Arc::new(LibsqlNavigationStore::new(db.clone())));

    let (mut tree, report) = sync.load_all().await?;
    if !report.is_clean() {
        tracing::warn!(
            "Repaired navigation data at load: {}",
            serde_json::to_string(&report)?
        );
    }

    let outcome = run(&mut tree, args.command.unwrap_or(Command::Show { json: false }));

    // Persist whatever was applied before reporting a failure
    sync.shutdown().await;
    db.close().await?;
    outcome
}

fn run(tree: &mut NavigationTree, command: Command) -> anyhow::Result<()> {
    let root = tree.root_id();
    match command {
        Command::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&to_json(tree, root))?);
            } else {
                print_tree(tree, root, 0);
            }
        }
        Command::AddGroup { title, placement } => {
            add(tree, NavigationNode::composite(title), placement)?
        }
        Command::AddList { title, placement } => add(tree, NavigationNode::leaf(title), placement)?,
        Command::Rename { id, title } => tree.set_title(id, title)?,
        Command::Move { id, index, parent } => tree.move_node(id, parent.unwrap_or(root), index)?,
        Command::Remove { id } => {
            let removed = tree.remove(id)?;
            println!("removed {} node(s)", removed.len());
        }
    }
    Ok(())
}

fn add(tree: &mut NavigationTree, node: NavigationNode, placement: Placement) -> anyhow::Result<()> {
    let id = node.id();
    match (placement.parent, placement.index) {
        (Some(parent), index) => {
            let index = index.unwrap_or_else(|| tree.children(parent).count());
            tree.insert(parent, node, index)?;
        }
        (None, Some(index)) => {
            let root = tree.root_id();
            tree.insert(root, node, index)?;
        }
        (None, None) => {
            tree.insert_relative(placement.after, node)?;
        }
    }
    println!("{}", id);
    Ok(())
}

fn print_tree(tree: &NavigationTree, id: NavigationId, depth: usize) {
    for child in tree.children(id) {
        let marker = if child.is_composite() { "+" } else { "-" };
        println!(
            "{}{} {}  [{} @ {}]",
            "  ".repeat(depth),
            marker,
            child.title(),
            child.id(),
            child.position()
        );
        if child.is_composite() {
            print_tree(tree, child.id(), depth + 1);
        }
    }
}

fn to_json(tree: &NavigationTree, id: NavigationId) -> Value {
    let children: Vec<Value> = tree.children(id).map(|c| to_json(tree, c.id())).collect();
    match tree.get(id) {
        Some(node) => json!({
            "id": node.id(),
            "title": node.title(),
            "kind": node.kind(),
            "position": node.position(),
            "children": children,
        }),
        None => Value::Null,
    }
}
