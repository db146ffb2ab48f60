//! The bundled demo models and the CLI commands for interacting with them.
use super::{RunOpts, handle_run_command};
use crate::settings::Settings;
use anyhow::{Context, Result, bail, ensure};
use clap::Subcommand;
use include_dir::{Dir, DirEntry, include_dir};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The directory containing the demo models.
const DEMOS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/demos");

/// The name of the file describing each demo model
const README_FILE_NAME: &str = "README.txt";

/// The available subcommands for managing example models.
#[derive(Subcommand)]
pub enum ExampleSubcommands {
    /// List available examples.
    List,
    /// Provide information about the specified example.
    Info {
        /// The name of the example.
        name: String,
    },
    /// Extract an example model configuration to a new directory.
    Extract {
        /// The name of the example to extract.
        name: String,
        /// The destination folder for the example.
        new_path: Option<PathBuf>,
    },
    /// Run an example.
    Run {
        /// The name of the example to run.
        name: String,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
}

impl ExampleSubcommands {
    /// Execute the supplied example subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => {
                for name in example_names() {
                    println!("{name}");
                }
            }
            Self::Info { name } => println!("{}", example_readme(&name)?),
            Self::Extract { name, new_path } => {
                let dest = new_path.unwrap_or_else(|| PathBuf::from(&name));
                extract_example(&name, &dest)?;
            }
            Self::Run { name, opts } => handle_example_run_command(&name, &opts, None)?,
        }

        Ok(())
    }
}

/// The names of all bundled examples
pub fn example_names() -> impl Iterator<Item = String> {
    DEMOS_DIR
        .dirs()
        .map(|dir| dir.path().display().to_string())
}

/// Get the README for the specified example
fn example_readme(name: &str) -> Result<&'static str> {
    let path: PathBuf = [name, README_FILE_NAME].iter().collect();
    DEMOS_DIR
        .get_file(path)
        .context("Example not found.")?
        .contents_utf8()
        .with_context(|| format!("{README_FILE_NAME} is not UTF-8 encoded"))
}

/// Extract the specified example to a new directory
pub fn extract_example(name: &str, new_path: &Path) -> Result<()> {
    let sub_dir = DEMOS_DIR.get_dir(name).context("Example not found.")?;

    ensure!(
        !new_path.exists(),
        "Destination directory {} already exists",
        new_path.display()
    );

    // Copy the contents of the subdirectory to the destination
    fs::create_dir_all(new_path)?;
    for entry in sub_dir.entries() {
        match entry {
            DirEntry::Dir(dir) => bail!(
                "Subdirectories in examples are not supported: {}",
                dir.path().display()
            ),
            DirEntry::File(f) => {
                let file_name = f
                    .path()
                    .file_name()
                    .context("Example file has no name")?;
                fs::write(new_path.join(file_name), f.contents())?;
            }
        }
    }

    Ok(())
}

/// Handle the `example run` command.
pub fn handle_example_run_command(
    name: &str,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let temp_dir = TempDir::new().context("Failed to create temporary directory.")?;
    let model_path = temp_dir.path().join(name);
    extract_example(name, &model_path)?;
    handle_run_command(&model_path, opts, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_example_names() {
        assert!(example_names().any(|name| name == "simple"));
    }

    #[test]
    fn test_example_readme() {
        assert!(!example_readme("simple").unwrap().is_empty());
        assert!(example_readme("missing").is_err());
    }

    #[test]
    fn test_extract_example() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("simple");
        extract_example("simple", &dest).unwrap();
        assert!(dest.join("model.toml").is_file());
        assert!(dest.join("lulc_lookup.csv").is_file());

        // Cannot extract over an existing directory
        assert!(extract_example("simple", &dest).is_err());
    }
}
