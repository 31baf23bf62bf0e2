use anyhow::Result;
use inquire::Confirm;
use renamer_core::{Mapping, Status};
use std::path::Path;

pub fn show_rename_and_confirm(old_path: &Path, new_path: &Path) -> Result<bool> {
    println!("\n📁 Rename:");
    println!("  \x1b[31m- {}\x1b[0m", old_path.display());
    println!("  \x1b[32m+ {}\x1b[0m", new_path.display());

    let apply_change = Confirm::new("Apply this rename?")
        .with_default(true)
        .prompt()?;

    Ok(apply_change)
}

pub fn describe(mapping: &Mapping) -> String {
    let (style, mark) = match mapping.status {
        Status::Success => ("\x1b[32m", "✓"),
        Status::Error => ("\x1b[31m", "✗"),
        Status::Pending => ("\x1b[33m", "·"),
    };
    let mut line = format!(
        "{}{} {} -> {}\x1b[0m",
        style,
        mark,
        mapping.old_path.display(),
        mapping.new_path.display()
    );
    if let Some(message) = &mapping.message {
        line.push_str(&format!(" ({message})"));
    }
    line
}
