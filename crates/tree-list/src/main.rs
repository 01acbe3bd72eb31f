//! Print a directory as an expandable, sectioned list
//!
//! Usage:
//!   tree-list [--lazy] [--expand-all] [path...]
//!
//! Each path becomes a root. Without paths the current directory is used.
//! Set `RUST_LOG=debug` to watch loads and edits.

use anyhow::Context;
use log::{info, warn};
use std::env;
use tree_list::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut options = TreeOptions::new().expand_roots(true);
    let mut expand_all = false;
    let mut paths = Vec::new();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--lazy" => options = options.lazy(),
            "--expand-all" => expand_all = true,
            _ => paths.push(arg),
        }
    }
    if paths.is_empty() {
        paths.push(".".to_string());
    }

    let source = FilesystemSource::with_roots(&paths)
        .with_context(|| format!("Failed to open {}", paths.join(", ")))?;
    let mut list = TreeList::with_options(source, options);
    list.load_roots();
    if expand_all {
        list.batch(|list| {
            let roots: Vec<NodeId> = list.store().roots().cloned().collect();
            for root in roots {
                if let Err(e) = list.set_expanded(&root, true, true) {
                    warn!("Could not expand {root}: {e}");
                }
            }
        });
    }

    let store = list.store();
    info!(
        "Loaded {} roots, {} nodes, {} visible rows",
        store.root_count(),
        store.node_count(),
        store.total_visible_rows()
    );

    for (index, root) in store.roots().enumerate() {
        let header = store.payload(root).context("root without payload")?;
        println!("{}", header.path.display());
        for row in store.rows(index) {
            let marker = match (row.child_count, row.expanded) {
                (0, _) if !row.payload.is_dir() => " ",
                (_, true) => "▾",
                _ => "▸",
            };
            println!(
                "{}{} {}",
                "  ".repeat(row.level),
                marker,
                row.payload
            );
        }
        println!();
    }

    println!(
        "{} rows across {} roots",
        store.total_visible_rows(),
        store.root_count()
    );
    Ok(())
}
