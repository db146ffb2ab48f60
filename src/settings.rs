//! Program-wide settings for bluecarbon, read from `settings.toml` in the user's config folder.
//!
//! These only change how the program runs (logging and output handling). Everything that affects
//! the carbon results lives in the model directory instead, so that a model gives the same
//! outputs on any machine.
use crate::get_bluecarbon_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::{Context, Result};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# Settings for the bluecarbon coastal blue carbon model.
#
# These apply to every model you run. Options given on the command line take precedence, as does
# the BLUECARBON_LOG_LEVEL environment variable for the log level. Model inputs such as carbon
# pools, transition matrices and prices belong in each model's own directory.
#
# Uncomment a setting to change it from its default value.
";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    let mut path = get_bluecarbon_config_dir();
    path.push(SETTINGS_FILE_NAME);

    path
}

/// Settings shared by every model run
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Log level for the terminal and the run's log files (off, error, warn, info, debug or
    /// trace). The BLUECARBON_LOG_LEVEL environment variable overrides this.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Replace the results folder of an earlier run of the same model instead of failing
    #[serde(default)]
    pub overwrite: bool,
    /// Also write per-pool stock rasters and the observed transition rasters for each
    /// transition year
    #[serde(default)]
    pub debug_model: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
            debug_model: false,
        }
    }
}

impl Settings {
    /// Read the settings file from the user's config folder.
    ///
    /// Defaults are used if there is no settings file.
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    /// Read settings from the specified path, using defaults if the file does not exist
    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(file_path)
    }

    /// The contents of a settings file which documents every setting and leaves it at its default.
    ///
    /// Each setting is written commented out, preceded by its doc comment.
    pub fn default_file_contents() -> Result<String> {
        let settings_raw = toml::to_string(&Settings::default())
            .context("Could not convert default settings to TOML")?;

        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in settings_raw.lines() {
            let Some((field, _)) = line.split_once('=') else {
                continue;
            };

            let field = field.trim();
            let docs = Settings::get_field_docs(field)
                .with_context(|| format!("Missing documentation for setting {field}"))?;
            out.push('\n');
            for doc_line in docs.lines() {
                writeln!(out, "# # {}", doc_line.trim())?;
            }
            writeln!(out, "# {}", line.trim())?;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_settings_load_from_path_no_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME); // NB: doesn't exist
        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_settings_load_from_path() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "log_level = \"warn\"").unwrap();
        }

        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings {
                log_level: "warn".to_string(),
                debug_model: false,
                overwrite: false
            }
        );
    }

    #[test]
    fn test_default_file_contents() {
        let contents = Settings::default_file_contents().unwrap();
        assert!(contents.starts_with(DEFAULT_SETTINGS_FILE_HEADER));
        assert!(contents.contains("# log_level = \"info\""));
        assert!(contents.contains("# # Replace the results folder"));

        // Every setting is commented out, so the file gives the defaults
        let settings: Settings = toml::from_str(&contents).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
