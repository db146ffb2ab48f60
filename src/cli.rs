//! The command line interface for the model.
use crate::input::load_model;
use crate::log;
use crate::output::{create_output_directory, get_output_dir};
use crate::preprocess::preprocess;
use crate::settings::Settings;
use crate::simulation::classify_all;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the model.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Whether to write per-pool stocks and observed transitions to file
    #[arg(long)]
    pub debug_model: bool,
}

/// Options for the preprocess command
#[derive(Args, Default)]
pub struct PreprocessOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a blue carbon model.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate a model without running it.
    Validate {
        /// The path to the model directory.
        model_dir: PathBuf,
    },
    /// Draft a transition matrix and carbon pool tables from a model's LULC maps.
    Preprocess {
        /// The path to the model directory.
        model_dir: PathBuf,
        /// Other preprocessor options
        #[command(flatten)]
        opts: PreprocessOpts,
    },
    /// Manage example models.
    Example {
        /// The available subcommands for managing example models.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Manage program settings.
    Settings {
        /// The subcommands for managing settings.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
            Self::Preprocess { model_dir, opts } => {
                handle_preprocess_command(&model_dir, &opts, None)
            }
            Self::Example { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ bluecarbon --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // Output program help in markdown format
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Work out the output folder and create it.
///
/// # Returns
///
/// The path to the folder and whether existing files in it will be overwritten
fn prepare_output_dir(
    model_path: &Path,
    output_dir: Option<&Path>,
    overwrite: bool,
) -> Result<(PathBuf, bool)> {
    let output_path = match output_dir {
        Some(path) => path.to_path_buf(),
        None => get_output_dir(model_path)?,
    };

    let overwrite = create_output_directory(&output_path, overwrite).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;

    Ok((output_path, overwrite))
}

/// Handle the `run` command.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;

    // These settings can be overridden by command-line arguments
    let debug_model = opts.debug_model || settings.debug_model;
    let (output_path, overwrite) = prepare_output_dir(
        model_path,
        opts.output_dir.as_deref(),
        opts.overwrite || settings.overwrite,
    )?;

    // Initialise program logger
    log::init(Some(settings.log_level.as_str()), Some(output_path.as_path()))
        .context("Failed to initialise logging.")?;

    // Load the model to run
    let model = load_model(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    // Run the simulation
    crate::simulation::run(&model, &output_path, debug_model)?;
    info!("Simulation complete!");

    Ok(())
}

/// Handle the `validate` command.
///
/// As well as loading the model, every transition between maps is classified, so that unmapped
/// pairs of classes are reported.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(settings.log_level.as_str()), None).context("Failed to initialise logging.")?;

    // Load/validate the model
    let model = load_model(model_path).context("Failed to validate model.")?;
    classify_all(&model).context("Failed to validate model.")?;
    info!("Model validation successful!");

    Ok(())
}

/// Handle the `preprocess` command.
pub fn handle_preprocess_command(
    model_path: &Path,
    opts: &PreprocessOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    let (output_path, overwrite) = prepare_output_dir(
        model_path,
        opts.output_dir.as_deref(),
        opts.overwrite || settings.overwrite,
    )?;

    log::init(Some(settings.log_level.as_str()), Some(output_path.as_path()))
        .context("Failed to initialise logging.")?;
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    preprocess(model_path, &output_path).context("Failed to preprocess model.")?;
    info!(
        "Draft transition matrix and carbon pool templates written to {}",
        output_path.display()
    );

    Ok(())
}
