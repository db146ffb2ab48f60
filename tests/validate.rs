//! Integration tests for the `validate` command.
use bluecarbon::cli::handle_validate_command;
use bluecarbon::log::is_logger_initialised;
use bluecarbon::settings::Settings;
use std::path::PathBuf;

/// Get the path to the demo model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

/// An integration test for the `validate` command.
///
/// We also check that the logger is initialised after it is run.
#[test]
fn test_handle_validate_command() {
    unsafe { std::env::set_var("BLUECARBON_LOG_LEVEL", "off") };

    assert!(!is_logger_initialised());

    handle_validate_command(&get_model_dir(), Some(Settings::default())).unwrap();

    assert!(is_logger_initialised());
}
