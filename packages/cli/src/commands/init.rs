use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::Path;
use tessera_editor::{EditorConfig, DEFAULT_CONFIG_NAME};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Name of the top-level field holding the entity array
    #[arg(short, long, default_value = "entities")]
    pub field: String,

    /// Force overwrite existing config
    #[arg(long)]
    pub force: bool,
}

pub fn init(args: InitArgs, dir: &Path) -> Result<()> {
    let config_path = dir.join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = EditorConfig {
        splice_field: args.field,
        ..EditorConfig::default()
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)? + "\n")?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    Ok(())
}
