//! The `settings` subcommands, for managing the program settings file.
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::Path;

/// Subcommands for settings
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Open the settings file in a text editor, creating it first if needed
    Edit,
    /// Print the path of the settings file
    Path,
    /// Print the contents of a default `settings.toml`
    DumpDefault,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Edit => {
                let file_path = get_settings_file_path();
                create_default_settings_file(&file_path)?;
                println!("Opening settings file for editing: {}", file_path.display());
                edit::edit_file(&file_path)
                    .with_context(|| format!("Could not edit {}", file_path.display()))?;
            }
            Self::Path => println!("{}", get_settings_file_path().display()),
            Self::DumpDefault => print!("{}", Settings::default_file_contents()?),
        }

        Ok(())
    }
}

/// Write a default settings file to `file_path` unless there is one already.
///
/// # Returns
///
/// Whether a new file was written
fn create_default_settings_file(file_path: &Path) -> Result<bool> {
    if file_path.is_file() {
        return Ok(false);
    }

    if let Some(dir_path) = file_path.parent() {
        fs::create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
    }
    fs::write(file_path, Settings::default_file_contents()?)?;

    Ok(true)
}
