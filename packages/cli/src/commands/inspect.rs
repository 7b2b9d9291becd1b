use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tessera_editor::EditorConfig;
use tessera_syntax::Node;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Prefab file to inspect
    pub file: PathBuf,

    /// Print every entity as a tree
    #[arg(short, long)]
    pub tree: bool,
}

pub fn inspect(args: InspectArgs, config: &EditorConfig) -> Result<()> {
    let bytes = fs::read(&args.file)?;
    let parser = config.parser();
    let (document, warnings) = parser.parse(&bytes)?;

    println!("🔍 {}", args.file.display().to_string().bright_white().bold());
    println!("   Size: {} bytes", bytes.len());
    println!(
        "   Entities: {} top-level, {} total",
        document.root().children().len(),
        document.root().subtree_len() - 1
    );

    if !document.metadata().is_empty() {
        println!();
        println!("   {}", "Metadata".bold());
        for (key, value) in document.metadata() {
            println!("     {}: {}", key.cyan(), value);
        }
    }

    let mut ranges: Vec<_> = document.ranges().iter().collect();
    ranges.sort_by_key(|(_, range)| range.start);
    println!();
    println!("   {}", "Byte ranges".bold());
    for (key, range) in ranges {
        let marker = if key == parser.entities_field() {
            "*".green()
        } else {
            " ".normal()
        };
        println!("    {}{}: {}..{}", marker, key, range.start, range.end);
    }

    if args.tree {
        println!();
        for child in document.root().children() {
            print_tree(child, 1);
        }
    }

    if !warnings.is_empty() {
        println!();
        for warning in &warnings {
            println!("   {} {}", "⚠".yellow(), warning);
        }
    }

    Ok(())
}

fn print_tree(node: &Node, depth: usize) {
    let id = node
        .id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "<no id>".dimmed().to_string());
    println!(
        "{}{} {} ({} properties)",
        "  ".repeat(depth + 1),
        node.kind().cyan(),
        id,
        node.properties().len()
    );
    for child in node.children() {
        print_tree(child, depth + 1);
    }
}
