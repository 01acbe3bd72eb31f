//! Example that loads a directory lazily and edits it as a list
//!
//! Usage:
//!   cargo run --example list_directory [path]
//!
//! If no path is provided, uses the current directory.

use std::env;
use tree_list::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = env::args().nth(1).unwrap_or_else(|| ".".to_string());
    println!("Loading directory: {}", path);
    println!();

    let source = FilesystemSource::new(&path)?;
    let mut list = TreeList::with_options(source, TreeOptions::new().lazy());
    list.on_change(|changes| {
        for change in changes {
            println!("  change: {} {:?}", change.kind(), change.coordinates());
        }
    });
    list.load_roots();

    let root = list
        .store()
        .roots()
        .next()
        .cloned()
        .expect("source has one root");

    println!("Expanding {}:", root);
    list.expand(&root)?;
    print_rows(&list);

    // Expand the first subdirectory, then collapse everything in one batch
    let first_dir = list
        .store()
        .rows(0)
        .find(|row| row.payload.is_dir())
        .map(|row| row.id.clone());
    if let Some(dir) = first_dir {
        println!("Expanding {}:", dir);
        list.expand(&dir)?;
        print_rows(&list);

        println!("Collapsing {} and {} in one batch:", dir, root);
        list.begin_batch();
        list.collapse(&dir)?;
        list.collapse(&root)?;
        list.end_batch();
        print_rows(&list);
    }

    println!("Summary:");
    println!("  Materialized nodes: {}", list.store().node_count());
    let total_size: u64 = list
        .store()
        .walk(TraversalOrder::PreOrder)
        .map(|node| node.payload.size)
        .sum();
    println!("  Size of loaded files: {}", format_size(total_size));
    Ok(())
}

fn print_rows(list: &TreeList<FilesystemSource>) {
    for row in list.store().rows(0) {
        let icon = if row.payload.is_dir() { "📁" } else { "📄" };
        println!("{}{} {}", "  ".repeat(row.level), icon, row.payload);
    }
    println!();
}

/// Format file size in human-readable format
fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit_index = 0;
    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
