use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tessera_editor::{EditorConfig, NodeCommand, NodeId};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Prefab file to edit
    pub file: PathBuf,

    /// Entity as JSON, e.g. '{"id": 3, "type": "Enemy"}'
    pub entity: String,

    /// Parent entity id (defaults to the top level)
    #[arg(short, long)]
    pub parent: Option<String>,

    /// Position among the parent's children (defaults to last)
    #[arg(short, long)]
    pub index: Option<usize>,
}

pub fn add(args: AddArgs, config: &EditorConfig) -> Result<()> {
    let (mut cache, mut session) = super::open(&args.file, config)?;

    let value: serde_json::Value = serde_json::from_str(&args.entity)?;
    let (entity, warnings) = config.parser().parse_entity(value)?;
    if let Some(warning) = warnings.first() {
        return Err(anyhow!("Invalid entity: {}", warning));
    }

    let parent = args.parent.map(NodeId::new).transpose()?;
    let siblings = match &parent {
        None => session.root().children().len(),
        Some(id) => session
            .document()
            .find(id)
            .ok_or_else(|| anyhow!("Parent not found: {}", id))?
            .children()
            .len(),
    };
    let index = args.index.unwrap_or(siblings);

    let id = entity.id().map(|id| id.to_string()).unwrap_or_default();
    let label = format!("{} {}", entity.kind(), id);
    let command = NodeCommand::add_element(parent, index, entity)?;
    session.edit(command, false)?;

    println!("➕ {} {}", "Added".green().bold(), label.trim().bright_white());
    super::save(&mut cache, &mut session)
}
