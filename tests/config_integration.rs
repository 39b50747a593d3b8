//! Integration tests for configuration loading precedence

mod common;

use coboard::cli::{Cli, Commands};
use coboard::config::Config;
use common::temp_config_file;
use serial_test::serial;

const OVERRIDE_VARS: [&str; 4] = [
    "OPENAI_API_KEY",
    "COBOARD_MODEL",
    "COBOARD_BIND_ADDR",
    "COBOARD_RECENT_WINDOW",
];

fn clear_env() {
    for var in OVERRIDE_VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_shipped_config_is_valid() {
    clear_env();
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/config.yaml");
    let config = Config::load(path, &Cli::default()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.board.recent_window, 10);
    assert!(config.storage.db_path.is_none());
}

#[test]
#[serial]
fn test_file_then_env_then_cli_precedence() {
    clear_env();
    let (_dir, path) = temp_config_file(
        r#"
server:
  bind_addr: "127.0.0.1:9000"
provider:
  model: "from-file"
board:
  recent_window: 6
"#,
    );

    std::env::set_var("COBOARD_MODEL", "from-env");
    std::env::set_var("COBOARD_BIND_ADDR", "127.0.0.1:9100");
    std::env::set_var("OPENAI_API_KEY", "sk-env");

    let cli = Cli {
        storage_path: Some("/tmp/cli-board.db".to_string()),
        command: Commands::Serve {
            bind: Some("127.0.0.1:9200".to_string()),
        },
        ..Cli::default()
    };
    let config = Config::load(path.to_str().unwrap(), &cli).unwrap();
    clear_env();

    assert_eq!(config.provider.model, "from-env");
    assert_eq!(config.provider.api_key.as_deref(), Some("sk-env"));
    assert_eq!(config.server.bind_addr, "127.0.0.1:9200");
    assert_eq!(config.storage.db_path.as_deref(), Some("/tmp/cli-board.db"));
    assert_eq!(config.board.recent_window, 6);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_invalid_env_number_is_ignored() {
    clear_env();
    std::env::set_var("COBOARD_RECENT_WINDOW", "zehn");
    let config = Config::load("/nonexistent/config.yaml", &Cli::default()).unwrap();
    clear_env();
    assert_eq!(config.board.recent_window, 10);
}

#[test]
#[serial]
fn test_malformed_file_is_a_config_error() {
    clear_env();
    let (_dir, path) = temp_config_file("board: [not, a, map]");
    let err = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}
