use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;
use tessera_editor::{EditorConfig, NodeCommand, NodeId, PropertyValue};

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Prefab file to edit
    pub file: PathBuf,

    /// Entity id
    pub id: String,

    /// Property name
    pub property: String,

    /// New value as JSON; anything that is not valid JSON is taken as a string
    pub value: String,

    /// Bind the property to a named reference instead of a literal
    #[arg(long = "ref")]
    pub reference: bool,
}

pub fn parse_value(raw: &str, reference: bool) -> PropertyValue {
    if reference {
        return PropertyValue::reference(raw);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    PropertyValue::Literal(value)
}

pub fn set(args: SetArgs, config: &EditorConfig) -> Result<()> {
    let (mut cache, mut session) = super::open(&args.file, config)?;

    let id = NodeId::new(args.id)?;
    let value = parse_value(&args.value, args.reference);
    let command = NodeCommand::set_property(session.root(), id.clone(), &args.property, value)?;
    session.edit(command, false)?;

    println!(
        "✏️  {} {} on {}",
        "Set".green().bold(),
        args.property.cyan(),
        id.to_string().bright_white()
    );
    super::save(&mut cache, &mut session)
}
